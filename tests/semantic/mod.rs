mod test_chains;
mod test_memoization;
mod test_resolution;

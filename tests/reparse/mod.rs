mod test_patch_equivalence;

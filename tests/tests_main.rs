#[path = "helpers/mod.rs"]
mod helpers;

#[path = "semantic/mod.rs"]
mod semantic;

#[path = "reparse/mod.rs"]
mod reparse;

#[path = "project/mod.rs"]
mod project;

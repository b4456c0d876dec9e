mod test_project_workflow;

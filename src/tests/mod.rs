mod pipeline_tests;

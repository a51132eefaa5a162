mod engine_tests;
mod navigation_tests;

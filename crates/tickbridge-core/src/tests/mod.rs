mod action_tests;
mod error_tests;

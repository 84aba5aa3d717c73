//! Integration tests for the Stockscan server

mod api_tests;

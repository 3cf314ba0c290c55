//! API integration tests, driven through the router over an in-memory store

mod api_tests;
mod common;

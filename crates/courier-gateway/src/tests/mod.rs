//! Test suites for the invocation gateway.

mod concurrency;
mod support;

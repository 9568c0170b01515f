//! Behavioural suites for the worker.

mod support;
mod worker_behaviour;

//! Cross-module tests: astronomical properties over a full nodal cycle and
//! end-to-end predictions against the bundled station snapshot.

mod astronomy_tests;

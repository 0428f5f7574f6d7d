//! Shared fixtures, findings builders and collaborator fakes for unit tests.

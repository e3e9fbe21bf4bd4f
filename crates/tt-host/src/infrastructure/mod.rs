//! Infrastructure layer for the host application.
//!
//! Contains OS-facing adapters: the backend session socket, file-system
//! storage for configuration, and the operator console parser.
//!
//! **Dependency rule**: this layer may depend on `application` and `tt_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod network;
pub mod storage;

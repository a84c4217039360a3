//! SQL utilities for the mapping layer
//!
//! Identifier naming, alias validation, canonical statement generation,
//! template substitution and parameter binding.

pub mod bind;
pub mod canonical;
pub mod naming;
pub mod sanitize;
pub mod template;

pub use bind::{BoundParam, BoundSql, KeyGenerator, KeyGenerators, PositionalSql, UuidGenerator};
pub use canonical::CanonicalSqlGenerator;
pub use naming::{decapitalize, delimit, rename};
pub use sanitize::{SQL_RESERVED_WORDS, is_blank, validate_alias};
pub use template::{format_indexed, substitute, substitute_pattern};

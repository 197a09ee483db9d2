//! # Adapters
//!
//! Implementations of the outbound key-management port.
//!
//! - [`aws_kms`]: AWS KMS through the AWS SDK
//! - [`local_kms`]: in-process secp256k1 keys for development and tests

pub mod aws_kms;
pub mod local_kms;

pub use aws_kms::{AwsKmsClient, AwsKmsClientFactory};
pub use local_kms::LocalKms;

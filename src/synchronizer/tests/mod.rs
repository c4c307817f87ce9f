use super::test_helpers::*;
use super::*;
use crate::config::{DownloadConfig, FailurePolicy};
use crate::error::CatalogError;
use crate::types::{DownloadOutcome, SkipReason};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::test_helpers::{ScriptedFetcher, columns, pipeline, pipeline_with_buffer, table};
use super::*;
use crate::types::TRY_DIFFERENT_COLUMNS;

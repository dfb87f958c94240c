//! Shared test harness modules for the GeoStore CLI.

use super::*;

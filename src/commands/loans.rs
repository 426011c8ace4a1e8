// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::obligations::{self, Side};
use anyhow::Result;
use rusqlite::Connection;

/// `loan collect` goes through [`obligations::record_payment`] so the
/// collection row, loan balance and account credit commit together.
pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    obligations::handle(conn, Side::Loan, m)
}

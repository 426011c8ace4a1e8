// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{SETTINGS, get_setting, pretty_table, req_arg, set_setting};
use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = req_arg(sub, "key")?.to_lowercase();
            let mut value = req_arg(sub, "value")?;
            if key == "currency" {
                value = value.to_uppercase();
            }
            set_setting(conn, &key, &value)?;
            info!(key = %key, value = %value, "setting changed");
            println!("{} = {}", key, value);
        }
        Some(("get", sub)) => {
            let key = req_arg(sub, "key")?.to_lowercase();
            println!("{}", get_setting(conn, &key)?);
        }
        Some(("list", _)) => {
            let mut rows = Vec::new();
            for (key, _) in SETTINGS {
                rows.push(vec![key.to_string(), get_setting(conn, key)?]);
            }
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}

// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn default_config_has_at_least_one_worker() {
    assert!(EngineConfig::default().worker_count >= 1);
}

#[test]
fn default_shutdown_grace_is_thirty_seconds() {
    assert_eq!(EngineConfig::default().shutdown_grace, Duration::from_secs(30));
}

// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn build_env_carries_inputs_and_fc_paths() {
    let mut inputs = HashMap::new();
    inputs.insert("GREETING".to_string(), "hi".to_string());
    let env = build_env(&inputs);
    assert_eq!(env.get("GREETING"), Some(&"hi".to_string()));
    assert_eq!(env.get("FC_OUTPUT"), Some(&CONTAINER_OUTPUT_PATH.to_string()));
    assert_eq!(env.get("FC_ARTIFACTS"), Some(&CONTAINER_ARTIFACTS_PATH.to_string()));
}

#[test]
fn parse_output_reads_dotenv_lines() {
    let result = parse_output(b"MESSAGE=hellothere\nOUT=hi-world\n");
    assert_eq!(result.get("MESSAGE"), Some(&"hellothere".to_string()));
    assert_eq!(result.get("OUT"), Some(&"hi-world".to_string()));
}

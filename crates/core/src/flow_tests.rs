// SPDX-License-Identifier: MIT

use super::*;

fn action(id: &str) -> Action {
    Action {
        id: id.into(),
        name: id.into(),
        executor: "script".into(),
        with: serde_yaml_ng::Value::Null,
        variables: Vec::new(),
        approval: false,
        condition: None,
        artifacts: Vec::new(),
        on: Vec::new(),
    }
}

fn flow(actions: Vec<Action>) -> Flow {
    Flow {
        id: "f1".into(),
        name: "test-flow".into(),
        schedule: None,
        namespace: "default".into(),
        inputs: Vec::new(),
        actions,
        outputs: Vec::new(),
    }
}

#[test]
fn validate_accepts_well_formed_flow() {
    let f = flow(vec![action("a"), action("b")]);
    assert!(f.validate().is_ok());
}

#[test]
fn validate_rejects_duplicate_action_ids() {
    let f = flow(vec![action("a"), action("a")]);
    let errs = f.validate().unwrap_err();
    assert_eq!(errs.len(), 1);
    assert!(matches!(&errs[0], FlowError::Validation { message, .. } if message.contains("duplicate")));
}

#[test]
fn validate_rejects_empty_executor() {
    let mut a = action("a");
    a.executor = String::new();
    let f = flow(vec![a]);
    let errs = f.validate().unwrap_err();
    assert_eq!(errs.len(), 1);
}

#[test]
fn validate_collects_multiple_errors() {
    let mut bad = action("a");
    bad.executor = String::new();
    let f = flow(vec![bad.clone(), bad]);
    // duplicate id + two empty-executor errors
    assert_eq!(f.validate().unwrap_err().len(), 3);
}

#[test]
fn validate_rejects_unbalanced_braces_in_variable() {
    let mut a = action("a");
    a.variables.push(Variable { name: "x".into(), value: "{{ input.name ".into() });
    let f = flow(vec![a]);
    assert!(f.validate().is_err());
}

#[test]
fn validate_rejects_unbalanced_braces_in_condition() {
    let mut a = action("a");
    a.condition = Some("input.ok }}".into());
    let f = flow(vec![a]);
    assert!(f.validate().is_err());
}

#[test]
fn validate_rejects_a_node_with_no_name() {
    let mut a = action("a");
    a.on.push(Node {
        name: String::new(),
        hostname: "10.0.0.1".into(),
        port: 22,
        username: "deploy".into(),
        os_family: OsFamily::Linux,
        connection_type: "ssh".into(),
        auth: NodeAuth::PrivateKey { key: "key-material".into() },
    });
    let f = flow(vec![a]);
    let errs = f.validate().unwrap_err();
    assert_eq!(errs.len(), 1);
    assert!(matches!(&errs[0], FlowError::Validation { field, .. } if field.contains("on[0].name")));
}

#[test]
fn action_lookup_by_id() {
    let f = flow(vec![action("a"), action("b")]);
    assert!(f.action("b").is_some());
    assert!(f.action("c").is_none());
}

#[test]
fn is_local_only_when_on_empty() {
    assert!(action("a").is_local_only());
}

#[test]
fn referenced_node_names_collects_across_actions() {
    let mut a = action("a");
    a.on.push(Node {
        name: "web-1".into(),
        hostname: "10.0.0.1".into(),
        port: 22,
        username: "deploy".into(),
        os_family: OsFamily::Linux,
        connection_type: "ssh".into(),
        auth: NodeAuth::PrivateKey { key: "key-material".into() },
    });
    let f = flow(vec![a]);
    let names = f.referenced_node_names();
    assert!(names.contains("web-1"));
}

#[test]
fn node_auth_method_name() {
    assert_eq!(NodeAuth::PrivateKey { key: "k".into() }.method(), "private_key");
    assert_eq!(NodeAuth::Password { key: "p".into() }.method(), "password");
}

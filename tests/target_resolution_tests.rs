use niso::deploy::{AddressLiteral, SshConfig, Target, TargetResolver, TargetSpec};
use niso::error::NisoError;
use proptest::prelude::*;
use std::path::Path;

fn instance_project(record: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let instances = dir.path().join("do/instances");
    std::fs::create_dir_all(&instances).unwrap();
    std::fs::write(instances.join("box-1.yml"), record).unwrap();
    dir
}

fn resolve(root: &Path, first: &str, rest: &[&str]) -> Result<(Target, Option<String>), NisoError> {
    let rest: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
    let spec = TargetSpec::from_args(first, &rest)?;
    let target = TargetResolver::new(root, SshConfig::default()).resolve(&spec)?;
    Ok((target, spec.role().map(str::to_string)))
}

#[test]
fn test_instance_flow_uses_first_ipv4() {
    let dir = instance_project(
        r#"
networks:
  v4:
    - ip_address: 203.0.113.7
      type: public
    - ip_address: 10.10.0.2
      type: private
  v6: []
"#,
    );

    let (target, role) = resolve(dir.path(), "do", &["box-1", "web"]).unwrap();
    assert_eq!(
        target,
        Target {
            user: "root".to_string(),
            host: "203.0.113.7".to_string(),
            port: "22".to_string(),
        }
    );
    assert_eq!(role.as_deref(), Some("web"));
}

#[test]
fn test_instance_flow_accepts_symbol_keys() {
    let dir = instance_project(":networks:\n  v4:\n    - ip_address: 198.51.100.4\n");
    let (target, _) = resolve(dir.path(), "do", &["box-1"]).unwrap();
    assert_eq!(target.host, "198.51.100.4");
}

#[test]
fn test_missing_instance_record() {
    let dir = tempfile::tempdir().unwrap();
    match resolve(dir.path(), "do", &["ghost", "web"]) {
        Err(NisoError::InstanceRecordNotFound { name, path }) => {
            assert_eq!(name, "ghost");
            assert!(path.ends_with("do/instances/ghost.yml"));
        }
        other => panic!("Expected InstanceRecordNotFound, got {other:?}"),
    }
}

#[test]
fn test_instance_without_ipv4() {
    let dir = instance_project("networks:\n  v4: []\n");
    assert!(matches!(
        resolve(dir.path(), "do", &["box-1"]),
        Err(NisoError::TargetParse { .. })
    ));
}

#[test]
fn test_malformed_instance_record() {
    let dir = instance_project("networks: [unclosed");
    assert!(matches!(
        resolve(dir.path(), "do", &["box-1"]),
        Err(NisoError::Parse { .. })
    ));
}

#[test]
fn test_address_flow_role() {
    let dir = tempfile::tempdir().unwrap();
    let (target, role) = resolve(dir.path(), "deploy@10.0.0.5:2222", &["db"]).unwrap();
    assert_eq!(target.to_string(), "deploy@10.0.0.5:2222");
    assert_eq!(role.as_deref(), Some("db"));
}

fn user_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z][a-z0-9_-]{0,8}")
}

fn host_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9-]{0,10}(\\.[a-z]{2,5}){0,2}",
        (1u8..=254, 0u8..=255, 0u8..=255, 1u8..=254)
            .prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}")),
    ]
}

fn port_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of((1u16..=65535).prop_map(|p| p.to_string()))
}

proptest! {
    #[test]
    fn prop_literal_components_round_trip(
        user in user_strategy(),
        host in host_strategy(),
        port in port_strategy(),
    ) {
        let mut spec = String::new();
        if let Some(user) = &user {
            spec.push_str(user);
            spec.push('@');
        }
        spec.push_str(&host);
        if let Some(port) = &port {
            spec.push(':');
            spec.push_str(port);
        }

        let literal = AddressLiteral::parse(&spec).unwrap();
        prop_assert_eq!(&literal.user, &user);
        prop_assert_eq!(&literal.host, &host);
        prop_assert_eq!(&literal.port, &port);

        let target = TargetResolver::new(".", SshConfig::default())
            .resolve_address(&spec)
            .unwrap();
        prop_assert_eq!(target.user, user.unwrap_or_else(|| "root".to_string()));
        prop_assert_eq!(target.host, host);
        prop_assert_eq!(target.port, port.unwrap_or_else(|| "22".to_string()));
    }
}

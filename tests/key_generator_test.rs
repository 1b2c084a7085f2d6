//! Tests for key derivation: operation keys, argument keys, determinism.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use mimir::{
    CacheArgument, DefaultKeyGenerator, HashedKeyGenerator, KeyGenerator, MimirError,
    OperationCall,
};

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
struct Pair {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
enum Filter {
    All,
    ById(u32),
    Range { from: u32, to: u32 },
}

fn key(arguments: &[&dyn CacheArgument]) -> Option<String> {
    DefaultKeyGenerator.argument_key(arguments).unwrap()
}

// ============================================================================
// Operation keys
// ============================================================================

#[test]
fn operation_key_is_the_signature() {
    let id = 1u32;
    let call = OperationCall::builder("app::Repo", "get").arg(&id).build();
    assert_eq!(DefaultKeyGenerator.operation_key(&call), "app::Repo.get(u32)");
    assert_eq!(HashedKeyGenerator::new().operation_key(&call), "app::Repo.get(u32)");
}

#[test]
fn overloads_get_different_operation_keys() {
    let text = String::from("same");
    let narrow = OperationCall::builder("Svc", "find")
        .arg_as("alloc::string::String", &text)
        .build();
    let wide = OperationCall::builder("Svc", "find")
        .arg_as("dyn core::any::Any", &text)
        .build();

    let generator = DefaultKeyGenerator;
    assert_ne!(generator.operation_key(&narrow), generator.operation_key(&wide));
    assert_eq!(
        generator.argument_key(narrow.arguments()).unwrap(),
        generator.argument_key(wide.arguments()).unwrap()
    );
}

// ============================================================================
// Argument keys
// ============================================================================

#[test]
fn no_arguments_have_a_null_key() {
    assert_eq!(key(&[]), None);
}

#[test]
fn single_argument_key_is_not_an_array() {
    let key = key(&[&"abc"]).unwrap();
    assert!(key.starts_with('{'));
}

#[test]
fn argument_order_matters() {
    assert_ne!(key(&[&1i32, &2i32]), key(&[&2i32, &1i32]));
}

#[test]
fn arguments_are_combined_not_concatenated() {
    // ("ab", "c") and ("a", "bc") would collide under naive joining
    assert_ne!(key(&[&"ab", &"c"]), key(&[&"a", &"bc"]));
}

#[test]
fn equal_arguments_give_identical_keys() {
    let first = Point { x: 1, y: 2 };
    let second = Point { x: 1, y: 2 };
    assert_eq!(key(&[&first, &"tag"]), key(&[&second, &"tag"]));
}

#[test]
fn structurally_equal_types_are_distinguished() {
    assert_ne!(key(&[&Point { x: 1, y: 2 }]), key(&[&Pair { x: 1, y: 2 }]));
}

#[test]
fn enum_variants_are_distinguished() {
    assert_ne!(key(&[&Filter::All]), key(&[&Filter::ById(0)]));
    assert_ne!(
        key(&[&Filter::ById(1)]),
        key(&[&Filter::Range { from: 1, to: 1 }])
    );
}

#[test]
fn absent_and_present_optionals_are_distinguished() {
    let none: Option<u32> = None;
    let zero: Option<u32> = Some(0);
    let unit = ();
    assert_ne!(key(&[&none]), key(&[&zero]));
    assert_ne!(key(&[&none]), key(&[&unit]));
}

#[test]
fn hash_map_keys_are_deterministic() {
    let mut forward = HashMap::new();
    let mut backward = HashMap::new();
    for i in 0..64 {
        forward.insert(format!("field-{i}"), i);
    }
    for i in (0..64).rev() {
        backward.insert(format!("field-{i}"), i);
    }

    assert_eq!(key(&[&forward]), key(&[&backward]));
}

#[test]
fn map_keys_that_render_alike_stay_distinct() {
    #[derive(Serialize, PartialEq, Eq, Hash)]
    #[serde(untagged)]
    enum Id {
        Name(String),
        Number(u32),
    }

    let by_name: HashMap<Id, u8> = [(Id::Name("1".to_string()), 0)].into_iter().collect();
    let by_number: HashMap<Id, u8> = [(Id::Number(1), 0)].into_iter().collect();
    assert_ne!(key(&[&by_name]), key(&[&by_number]));
}

mod billing {
    #[derive(serde::Serialize)]
    pub struct Account {
        pub id: u32,
    }
}

mod auth {
    #[derive(serde::Serialize)]
    pub struct Account {
        pub id: u32,
    }
}

#[derive(Serialize)]
struct Batch<T> {
    items: Vec<T>,
}

#[test]
fn same_named_types_in_a_generic_wrapper_are_distinguished() {
    let billing = Batch {
        items: vec![billing::Account { id: 1 }],
    };
    let auth = Batch {
        items: vec![auth::Account { id: 1 }],
    };
    assert_ne!(key(&[&billing]), key(&[&auth]));
}

#[test]
fn hash_map_and_btree_map_with_equal_entries_differ_by_type() {
    let hash: HashMap<&str, i32> = [("a", 1)].into_iter().collect();
    let btree: BTreeMap<&str, i32> = [("a", 1)].into_iter().collect();
    assert_ne!(key(&[&hash]), key(&[&btree]));
}

#[test]
fn keys_are_stable_across_generators() {
    let first = DefaultKeyGenerator::new();
    let second = DefaultKeyGenerator::new();
    let args: [&dyn CacheArgument; 2] = [&42u64, &"x"];
    assert_eq!(first.argument_key(&args).unwrap(), second.argument_key(&args).unwrap());
}

#[test]
fn hashed_keys_differ_for_different_arguments() {
    let generator = HashedKeyGenerator::new();
    let a = generator.argument_key(&[&1u32]).unwrap().unwrap();
    let b = generator.argument_key(&[&2u32]).unwrap().unwrap();
    assert_ne!(a, b);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
}

// ============================================================================
// Failures
// ============================================================================

struct Opaque;

impl Serialize for Opaque {
    fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("opaque values cannot be keyed"))
    }
}

#[test]
fn unserializable_argument_is_a_hard_failure() {
    let err = DefaultKeyGenerator
        .argument_key(&[&1u8, &Opaque])
        .unwrap_err();
    assert!(matches!(err, MimirError::Serialization(msg) if msg.contains("opaque")));
}

use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::json;

use treeargs::args::coerce::ArgValue;
use treeargs::args::input::InputObject;
use treeargs::args::standardize::standardize;
use treeargs::commands::accepts::ProviderRegistry;
use treeargs::config_file::ConfigError;
use treeargs::context::Context;
use treeargs::dispatch::{HandlerRegistry, Outcome, dispatch};
use treeargs::error::{BoxError, RouterError};
use treeargs::load_config;

fn write_command(root: &Path, path: &[&str], spec: &str) {
    let dir = path.iter().fold(root.to_path_buf(), |dir, p| dir.join(p));
    std::fs::create_dir_all(&dir).unwrap();
    let name = path.last().copied().unwrap_or("pizza");
    std::fs::write(dir.join(format!("{name}.sh")), "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::write(dir.join("spec.yaml"), spec).unwrap();
}

/// The pizza shop: cascading `quiet` and `delivery-zip-code` at the root, a
/// `list` command with a required sort and required data, and an `order`
/// command taking pass-through arguments with a `dine-in` child that does not.
fn pizza_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("pizza");
    write_command(
        &root,
        &[],
        r"
description: Order pizza from the command line
flags:
  quiet:
    shorthand: q
    cascades: true
  non-cascading:
    description: Only meaningful at the root
options:
  delivery-zip-code:
    description: Where to deliver
    cascades: true
",
    );
    write_command(
        &root,
        &["list"],
        r"
description: List menu items
flags:
  vegetarian: {}
options:
  sort:
    required: true
    accepts: [popularity, alphabetical]
data:
  required: true
  accepts: [toppings, crusts, sauces]
",
    );
    write_command(
        &root,
        &["order"],
        r"
description: Place an order
acceptsPassThroughArgs: true
options:
  size:
    accepts:
      provider: sizes
  slices:
    type: integer
data: {}
",
    );
    write_command(&root, &["order", "dine-in"], "description: Eat in\n");
    dir
}

fn providers() -> ProviderRegistry {
    let mut providers = ProviderRegistry::new();
    providers.register_async("sizes", || {
        async { Ok::<_, BoxError>(json!(["small", "medium", "large"])) }.boxed()
    });
    providers
}

fn pizza_context(dir: &tempfile::TempDir, raw: &str) -> Context {
    let config = load_config(None, Some(&dir.path().join("pizza"))).unwrap();
    let tokens = standardize(raw.split_whitespace(), 0);
    Context::new(config, providers(), tokens)
}

#[tokio::test]
async fn test_list_with_options_flags_and_data() {
    let dir = pizza_tree();
    let mut context = pizza_context(
        &dir,
        "list --delivery-zip-code 55555 --sort popularity -q --vegetarian toppings",
    );
    let organized = context.organized_arguments(false).await.unwrap().clone();
    assert_eq!(organized.command, "list");
    assert_eq!(organized.options, vec!["delivery-zip-code", "sort"]);
    assert_eq!(
        organized.values,
        vec![
            ArgValue::Text("55555".to_string()),
            ArgValue::Text("popularity".to_string())
        ]
    );
    assert_eq!(organized.flags, vec!["quiet", "vegetarian"]);
    assert_eq!(organized.data, Some(ArgValue::Text("toppings".to_string())));
}

#[tokio::test]
async fn test_list_without_sort() {
    let dir = pizza_tree();
    let mut context = pizza_context(&dir, "list toppings");
    match context.input(false).await {
        Err(RouterError::MissingRequiredOption { option }) => assert_eq!(option, "sort"),
        other => panic!("Expected MissingRequiredOption, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_without_data() {
    let dir = pizza_tree();
    let mut context = pizza_context(&dir, "list --sort popularity");
    match context.input(false).await {
        Err(RouterError::MissingRequiredData { command }) => assert_eq!(command, "list"),
        other => panic!("Expected MissingRequiredData, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_dot_is_data_not_a_command() {
    let dir = pizza_tree();
    let mut context = pizza_context(&dir, "list --sort popularity .");
    match context.organized_arguments(false).await {
        Err(RouterError::UnrecognizedValue { name, value, accepts }) => {
            assert_eq!(name, "data");
            assert_eq!(value, ".");
            assert_eq!(accepts, vec!["toppings", "crusts", "sauces"]);
        }
        other => panic!("Expected UnrecognizedValue, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_dot_at_root_is_unexpected_data() {
    let dir = pizza_tree();
    let mut context = pizza_context(&dir, ".");
    assert!(matches!(
        context.organized_arguments(false).await,
        Err(RouterError::UnexpectedData { .. })
    ));
}

#[tokio::test]
async fn test_pass_through_not_supported() {
    let dir = pizza_tree();
    let mut context = pizza_context(&dir, "order dine-in -- --pass-through-flag opt=value data");
    match context.organized_arguments(false).await {
        Err(RouterError::PassThroughNotSupported { command }) => {
            assert_eq!(command, "order dine-in");
        }
        other => panic!("Expected PassThroughNotSupported, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_cascade_visibility() {
    let dir = pizza_tree();

    // Cascading entries reach grandchildren
    let mut context = pizza_context(&dir, "order dine-in -q --delivery-zip-code 55555");
    let input = context.input(false).await.unwrap();
    assert!(input.flag("quiet"));
    assert_eq!(
        input.option("delivery-zip-code"),
        Some(&ArgValue::Text("55555".to_string()))
    );
    assert!(!input.flags.contains_key("non-cascading"));

    // Non-cascading entries stay at their own level
    let mut context = pizza_context(&dir, "list --non-cascading");
    match context.organized_arguments(false).await {
        Err(RouterError::UnrecognizedArgument { argument, command }) => {
            assert_eq!(argument, "--non-cascading");
            assert_eq!(command, "list");
        }
        other => panic!("Expected UnrecognizedArgument, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_provider_accepts_and_standardized_equals() {
    let dir = pizza_tree();
    let mut context = pizza_context(&dir, "order --size=large --slices=4 margherita -- --extra cheese");
    let input = context.input(false).await.unwrap();
    assert_eq!(
        serde_json::to_value(&input).unwrap(),
        json!({
            "command": "order",
            "flags": {"quiet": false},
            "options": {"delivery-zip-code": null, "size": "large", "slices": 4},
            "data": "margherita",
            "passThroughArgs": ["--extra", "cheese"]
        })
    );

    let mut context = pizza_context(&dir, "order --size huge");
    assert!(matches!(
        context.organized_arguments(false).await,
        Err(RouterError::UnrecognizedValue { .. })
    ));
}

#[tokio::test]
async fn test_typo_suggests_command() {
    let dir = pizza_tree();
    let mut context = pizza_context(&dir, "lst");
    match context.organized_arguments(false).await {
        Err(RouterError::UnexpectedData { data, suggestion, .. }) => {
            assert_eq!(data, "lst");
            assert_eq!(suggestion.as_deref(), Some("list"));
        }
        other => panic!("Expected UnexpectedData, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_dispatch_to_registered_handler() {
    let dir = pizza_tree();
    let seen: Arc<Mutex<Option<InputObject>>> = Arc::new(Mutex::new(None));
    let mut handlers = HandlerRegistry::new();
    let captured = Arc::clone(&seen);
    handlers.register("list", move |input| {
        let captured = Arc::clone(&captured);
        async move {
            *captured.lock() = Some(input);
            Ok::<_, BoxError>(0)
        }
        .boxed()
    });

    let mut context = pizza_context(&dir, "list --sort alphabetical crusts");
    let outcome = dispatch(&mut context, &handlers).await.unwrap();
    assert_eq!(outcome, Outcome::Completed(0));
    let input = seen.lock().take().unwrap();
    assert_eq!(input.command, "list");
    assert_eq!(input.data, Some(ArgValue::Text("crusts".to_string())));
    assert!(!input.flag("vegetarian"));
}

#[tokio::test]
async fn test_help_screen_for_root() {
    let dir = pizza_tree();
    let mut context = pizza_context(&dir, "--help");
    let Outcome::Help(help) = dispatch(&mut context, &HandlerRegistry::new()).await.unwrap() else {
        panic!("Expected help");
    };
    insta::assert_snapshot!(help.trim_end(), @r"
    pizza

    Order pizza from the command line

    Usage: pizza [command] [flags] [options]

    Commands:
      list   List menu items
      order  Place an order

    Flags:
      -h, --help           Show this help screen
          --non-cascading  Only meaningful at the root
      -q, --quiet
      -v, --version        Show the program name and version

    Options:
          --delivery-zip-code <value>  Where to deliver
    ");
}

#[tokio::test]
async fn test_broken_spec_is_a_config_error() {
    let dir = pizza_tree();
    std::fs::write(dir.path().join("pizza").join("list").join("extra.spec.json"), "{}").unwrap();
    let mut context = pizza_context(&dir, "list --sort popularity toppings");
    match context.organized_arguments(false).await {
        Err(RouterError::Configuration(ConfigError::SpecCount { found, .. })) => {
            assert_eq!(found, 2);
        }
        other => panic!("Expected SpecCount, got: {other:?}"),
    }
}

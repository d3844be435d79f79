//! End-to-end lifecycle of an article moving through its states.

use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use statehold::{
    args, Args, BoundType, ConfigError, Error, Host, MemberKind, StateError, StateKey,
    StateMachineDefinition, StateRegistry, StateSpec, Stateful,
};

#[derive(Debug, Default)]
struct Demanded;

#[derive(Clone, Debug)]
struct Cost {
    cost: f64,
}

#[derive(Clone, Debug)]
struct Sale {
    cost: Cost,
    price_sold: f64,
}

#[derive(Debug)]
struct Ordered {
    cost: Cost,
}

#[derive(Debug)]
struct InStock {
    cost: Cost,
    stock_location: i64,
}

#[derive(Debug)]
struct OnDispatch {
    sale: Sale,
    shipping_address: String,
}

#[derive(Debug)]
struct Sold {
    sale: Sale,
}

#[derive(Debug)]
struct Article {
    number: u32,
    category: String,
    initial_price: f64,
}

impl Article {
    fn new(number: u32, category: &str, initial_price: f64) -> Self {
        Self {
            number,
            category: category.to_string(),
            initial_price,
        }
    }
}

impl Host for Article {
    fn host_members() -> &'static [&'static str] {
        &["number", "category", "initial_price"]
    }
}

fn article_machine() -> Result<StateMachineDefinition, ConfigError> {
    let mut registry = StateRegistry::new();
    registry
        .state(StateSpec::<Demanded>::new().initial())?
        .state(
            StateSpec::<Cost>::new()
                .abstract_state()
                .attribute("cost", |s: &Cost| s.cost),
        )?
        .state(
            StateSpec::<Sale>::new()
                .abstract_state()
                .base(|s: &Sale| &s.cost)
                .attribute("price_sold", |s: &Sale| s.price_sold),
        )?
        // Destinations below are forward references to states registered
        // further down.
        .transition_to("order", "Ordered", |_: &Demanded, args: &Args| {
            Ok(Ordered {
                cost: Cost {
                    cost: args.get("cost")?,
                },
            })
        })?
        .transition_to("arrived_at_stock", "InStock", |s: &Ordered, args: &Args| {
            Ok(InStock {
                cost: s.cost.clone(),
                stock_location: args.get("stock_location")?,
            })
        })?
        .transition_to("ship", "OnDispatch", |s: &InStock, args: &Args| {
            Ok(OnDispatch {
                sale: Sale {
                    cost: s.cost.clone(),
                    price_sold: args.get("price_sold")?,
                },
                shipping_address: args.get("address")?,
            })
        })?
        .transition_to("arrived_at_customer", "Sold", |s: &OnDispatch, _: &Args| {
            Ok(Sold {
                sale: s.sale.clone(),
            })
        })?
        .property("margin", |s: &Sold| s.sale.price_sold - s.sale.cost.cost)?
        .state(StateSpec::<Ordered>::new().base(|s: &Ordered| &s.cost))?
        .state(
            StateSpec::<InStock>::new()
                .base(|s: &InStock| &s.cost)
                .attribute("stock_location", |s: &InStock| s.stock_location),
        )?
        .state(
            StateSpec::<OnDispatch>::new()
                .base(|s: &OnDispatch| &s.sale)
                .attribute("shipping_address", |s: &OnDispatch| {
                    s.shipping_address.clone()
                }),
        )?
        .state(StateSpec::<Sold>::new().base(|s: &Sold| &s.sale))?;
    registry.resolve()
}

static MACHINE: Lazy<StateMachineDefinition> =
    Lazy::new(|| article_machine().expect("article machine resolves"));

static ARTICLES: Lazy<BoundType<Article>> =
    Lazy::new(|| MACHINE.bind::<Article>().expect("article binds"));

fn new_article() -> Stateful<Article> {
    ARTICLES.construct(Article::new(1, "shoes", 44.99))
}

fn unavailable(member: &str, state: &str) -> Error {
    Error::State(StateError {
        host: "Article".to_string(),
        state: state.to_string(),
        member: member.to_string(),
    })
}

#[test]
fn article_walks_through_its_lifecycle() {
    let article = new_article();
    assert!(article.is_in::<Demanded>());
    assert_eq!(article.current_state(), StateKey::of::<Demanded>());

    article.fire("order", &args! { "cost" => 3.59 }).unwrap();
    assert!(article.is_in::<Ordered>());
    assert_eq!(article.get_as::<f64>("cost").unwrap(), 3.59);

    article
        .fire("arrived_at_stock", &args! { "stock_location" => 331 })
        .unwrap();
    assert!(article.is_in::<InStock>());
    assert_eq!(article.get_as::<i64>("stock_location").unwrap(), 331);

    article
        .fire("ship", &args! { "address" => "...", "price_sold" => 4.99 })
        .unwrap();
    assert!(article.is_in::<OnDispatch>());
    assert_eq!(
        article.get("stock_location").unwrap_err().to_string(),
        "Member stock_location is not available on class Article in state OnDispatch."
    );

    article.fire("arrived_at_customer", &Args::new()).unwrap();
    assert!(article.is_in::<Sold>());
    let margin = article.get_as::<f64>("margin").unwrap();
    assert_eq!((margin * 10_000.0).round() / 10_000.0, 1.4);
}

#[test]
fn host_fields_stay_reachable() {
    let mut article = new_article();

    assert_eq!(article.number, 1);
    assert_eq!(article.category, "shoes");
    assert_eq!(article.initial_price, 44.99);

    article.category = "boots".to_string();
    article.fire("order", &args! { "cost" => 3.59 }).unwrap();

    let host = article.into_host();
    assert_eq!(host.category, "boots");
}

#[test]
fn members_of_later_states_are_unavailable_early() {
    let article = new_article();
    assert_eq!(
        article.get("stock_location"),
        Err(unavailable("stock_location", "Demanded"))
    );
    assert_eq!(article.get("cost"), Err(unavailable("cost", "Demanded")));

    article.fire("order", &args! { "cost" => 3.59 }).unwrap();
    assert_eq!(
        article.get("stock_location"),
        Err(unavailable("stock_location", "Ordered"))
    );
    assert_eq!(
        article.fire("order", &args! { "cost" => 1.0 }),
        Err(unavailable("order", "Ordered"))
    );
}

#[test]
fn failed_capability_check_has_no_side_effect() {
    let article = new_article();
    article.fire("order", &args! { "cost" => 3.59 }).unwrap();

    let first = article.get("margin").unwrap_err().to_string();
    let second = article.get("margin").unwrap_err().to_string();
    let fired = article.fire("arrived_at_customer", &Args::new());

    assert_eq!(first, second);
    assert_eq!(fired, Err(unavailable("arrived_at_customer", "Ordered")));
    assert!(article.is_in::<Ordered>());
    assert_eq!(article.history().len(), 1);
}

#[test]
fn inherited_members_follow_the_composition() {
    let article = ARTICLES
        .construct_in(
            Article::new(2, "hats", 12.0),
            OnDispatch {
                sale: Sale {
                    cost: Cost { cost: 2.0 },
                    price_sold: 5.0,
                },
                shipping_address: "Main Street 1".to_string(),
            },
        )
        .unwrap();

    assert_eq!(article.get_as::<f64>("cost").unwrap(), 2.0);
    assert_eq!(article.get_as::<f64>("price_sold").unwrap(), 5.0);
    assert_eq!(
        article.get_as::<String>("shipping_address").unwrap(),
        "Main Street 1"
    );
    assert_eq!(
        article.with_state(|s: &OnDispatch| s.sale.price_sold),
        Some(5.0)
    );
    assert_eq!(article.with_state(|s: &Sold| s.sale.price_sold), None);
}

#[test]
fn history_records_the_path_taken() {
    let article = new_article();
    assert_eq!(article.path(), vec![StateKey::of::<Demanded>()]);

    article.fire("order", &args! { "cost" => 3.59 }).unwrap();
    article
        .fire("arrived_at_stock", &args! { "stock_location" => 331 })
        .unwrap();

    let history = article.history();
    let names: Vec<_> = history
        .transitions()
        .iter()
        .map(|t| t.transition.as_str())
        .collect();
    assert_eq!(names, vec!["order", "arrived_at_stock"]);
    assert_eq!(
        article.path(),
        vec![
            StateKey::of::<Demanded>(),
            StateKey::of::<Ordered>(),
            StateKey::of::<InStock>()
        ]
    );
}

#[test]
fn machine_lists_concrete_states_initial_first() {
    let names: Vec<_> = MACHINE.states().iter().map(|d| d.key().name()).collect();

    assert_eq!(
        names,
        vec!["Demanded", "Ordered", "InStock", "OnDispatch", "Sold"]
    );
    assert!(!MACHINE.contains(&StateKey::of::<Cost>()));
    assert!(!MACHINE.contains(&StateKey::of::<Sale>()));
}

#[test]
fn ordered_members_put_attributes_first() {
    let members = MACHINE.ordered_members();
    let kinds: Vec<MemberKind> = members.iter().map(|m| m.kind()).collect();
    let mut sorted = kinds.clone();
    sorted.sort();

    assert_eq!(kinds, sorted);
    assert_eq!(members.len(), 9);
    assert_eq!(
        members.last().map(|m| m.name()),
        Some("arrived_at_customer")
    );
}

#[test]
fn unknown_argument_shape_fails_without_transition() {
    let article = new_article();

    let result = article.fire("order", &args! { "cost" => "cheap" });

    assert!(matches!(result, Err(Error::Member(_))));
    assert!(article.is_in::<Demanded>());
}

#[test]
fn readers_observe_whole_states_during_transitions() {
    let article = new_article();
    article.fire("order", &args! { "cost" => 3.59 }).unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            article
                .fire("arrived_at_stock", &args! { "stock_location" => 331 })
                .unwrap();
        });
        for _ in 0..100 {
            let state = article.current_state();
            assert!(
                state == StateKey::of::<Ordered>() || state == StateKey::of::<InStock>(),
                "unexpected state {state}"
            );
            match article.get("stock_location") {
                Ok(value) => assert_eq!(value, serde_json::json!(331)),
                Err(error) => assert_eq!(error, unavailable("stock_location", "Ordered")),
            }
        }
    });

    assert!(article.is_in::<InStock>());
}

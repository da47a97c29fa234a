//! # Basic Usage Example
//!
//! This example demonstrates the fundamental concepts of QueryHaus:
//! - Defining models with the `#[model]` macro
//! - Building immutable query sets and branching them
//! - Composite AND/OR filters
//! - Aggregates, projections and batch update/delete
//! - Inserting and saving model instances
//!
//! It runs against an in-memory SQLite database, so no setup is needed.

use queryhaus::prelude::*;
use queryhaus::DatabasePool;

/// A person with an optional email and a yearly income
#[model]
#[table(name = "person")]
pub struct Person {
    /// Primary key field
    #[primary_key]
    pub id: i64,

    pub name: String,

    /// Optional field - demonstrates nullable columns
    pub email: Option<String>,

    pub income: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("QueryHaus Basic Usage Example");
    println!("=============================");

    // 1. Setup
    let config = DatabaseConfig::from_url("sqlite::memory:");
    let mut queryhaus = QueryHaus::connect(&config).await?;
    queryhaus.register::<Person>()?;

    let Some(DatabasePool::Sqlite(pool)) = queryhaus.pool() else {
        return Err("expected a SQLite pool".into());
    };
    sqlx::query(
        "CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT, income INTEGER NOT NULL)",
    )
    .execute(pool)
    .await?;
    let persons = queryhaus.store::<Person>()?;
    for (id, name, email, income) in [
        (1, "Ana", Some("ana@example.com"), 10000),
        (2, "Bob", None, 20000),
        (3, "Cid", Some("cid@example.com"), 30000),
    ] {
        let person = Person {
            id,
            name: name.to_string(),
            email: email.map(str::to_string),
            income,
        };
        persons.insert(&person).await?;
    }
    println!("Created and filled 'person'");

    // 2. Branch one base query set into two
    let people = queryhaus.objects::<Person>()?;
    let earners = people.filter("income", ">=", Some(json!(20000)))?;
    let reachable = earners.filter("email", "not null", None)?;

    println!("\nEarners ({}):", earners.count().await?);
    for person in earners.order_by("name", "asc")?.fetch().await? {
        println!("  {} earns {}", person.name, person.income);
    }
    println!("Reachable earners: {}", reachable.count().await?);

    // 3. Composite filter
    let either = people.filter_group(PredicateGroup::or([
        Predicate::ilike("name", "a%"),
        Predicate::is_null("email"),
    ]))?;
    let (sql, params) = either.filter_tree().ok_or("no filter")?.render()?;
    println!("\nWHERE {} with {:?}", sql, params);
    println!("Matches: {:?}", either.values_list(&["name"]).await?);

    // 4. Aggregates
    println!("\nAverage income: {}", people.avg("income").await?);
    println!("Total income: {}", people.sum("income").await?);

    // 5. Lookup, instance writes and batch writes
    let mut bob = persons.get(&[json!(2)]).await?;
    println!("\nPerson #2: {:?}", bob);
    bob.email = Some("bob@example.com".to_string());
    println!("Saving Bob: {:?}", persons.save(&bob).await?);

    let raised = earners.update(&UpdateSet::new().set("income", json!(25000))).await?;
    println!("Raised {} incomes", raised);

    let removed = people.filter("email", "is null", None)?.delete().await?;
    println!("Removed {} people without email", removed);
    println!("Remaining: {}", people.count().await?);

    Ok(())
}

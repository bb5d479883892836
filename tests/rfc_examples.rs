mod common;

use common::fixtures::{bookstore, filter_document};
use common::{TestResult, init_logger, locations, values};
use serde_json::json;

#[test]
fn test_bookstore_authors() -> TestResult {
    init_logger();
    let doc = bookstore();
    let expected = vec![
        json!("Nigel Rees"),
        json!("Evelyn Waugh"),
        json!("Herman Melville"),
        json!("J. R. R. Tolkien"),
    ];
    assert_eq!(values("$.store.book[*].author", &doc)?, expected);
    assert_eq!(values("$..author", &doc)?, expected);
    Ok(())
}

#[test]
fn test_bookstore_store_members_and_prices() -> TestResult {
    init_logger();
    let doc = bookstore();
    let store = values("$.store.*", &doc)?;
    assert_eq!(store.len(), 2);
    assert!(store[0].is_array());
    assert_eq!(store[1], json!({ "color": "red", "price": 399 }));

    assert_eq!(
        values("$.store..price", &doc)?,
        vec![json!(8.95), json!(12.99), json!(8.99), json!(22.99), json!(399)]
    );
    Ok(())
}

#[test]
fn test_bookstore_book_positions() -> TestResult {
    init_logger();
    let doc = bookstore();
    assert_eq!(values("$..book[2].title", &doc)?, vec![json!("Moby Dick")]);
    assert_eq!(values("$..book[2].author", &doc)?, vec![json!("Herman Melville")]);
    assert_eq!(values("$..book[2].publisher", &doc)?, Vec::<serde_json::Value>::new());
    assert_eq!(
        values("$..book[-1].title", &doc)?,
        vec![json!("The Lord of the Rings")]
    );
    let first_two = vec![json!("Sayings of the Century"), json!("Sword of Honour")];
    assert_eq!(values("$..book[0,1].title", &doc)?, first_two);
    assert_eq!(values("$..book[:2].title", &doc)?, first_two);
    Ok(())
}

#[test]
fn test_bookstore_filters() -> TestResult {
    init_logger();
    let doc = bookstore();
    assert_eq!(
        values("$..book[?@.isbn].title", &doc)?,
        vec![json!("Moby Dick"), json!("The Lord of the Rings")]
    );
    assert_eq!(
        values("$..book[?@.price<10].title", &doc)?,
        vec![json!("Sayings of the Century"), json!("Moby Dick")]
    );
    assert_eq!(
        values("$.store.book[?@.price > $.store.bicycle.price]", &doc)?,
        Vec::<serde_json::Value>::new()
    );
    assert_eq!(values("$..*", &doc)?.len(), 27);
    Ok(())
}

#[test]
fn test_bookstore_locations() -> TestResult {
    init_logger();
    let doc = bookstore();
    assert_eq!(
        locations("$.store.book[?@.price<10].title", &doc)?,
        vec![
            "$['store']['book'][0]['title']",
            "$['store']['book'][2]['title']",
        ]
    );
    assert_eq!(
        locations("$.store[?count(@.*) == 2]", &doc)?,
        vec!["$['store']['bicycle']"]
    );

    let located = jsonsift::query_located("$..book[-1].isbn", &doc)?;
    assert_eq!(located.len(), 1);
    assert_eq!(located[0].value, &json!("0-395-19395-8"));
    assert_eq!(located[0].location.to_pointer(), "/store/book/3/isbn");
    assert_eq!(located[0].location.resolve(&doc), Some(located[0].value));
    Ok(())
}

#[test]
fn test_slices() -> TestResult {
    init_logger();
    let doc = json!(["a", "b", "c", "d", "e", "f", "g"]);
    assert_eq!(values("$[1:3]", &doc)?, vec![json!("b"), json!("c")]);
    assert_eq!(values("$[5:]", &doc)?, vec![json!("f"), json!("g")]);
    assert_eq!(values("$[1:5:2]", &doc)?, vec![json!("b"), json!("d")]);
    assert_eq!(values("$[5:1:-2]", &doc)?, vec![json!("f"), json!("d")]);
    assert_eq!(
        values("$[::-1]", &doc)?,
        vec![
            json!("g"),
            json!("f"),
            json!("e"),
            json!("d"),
            json!("c"),
            json!("b"),
            json!("a"),
        ]
    );
    assert_eq!(values("$[::0]", &doc)?, Vec::<serde_json::Value>::new());
    Ok(())
}

#[test]
fn test_descendant_segments() -> TestResult {
    init_logger();
    let doc = json!({ "o": { "j": 1, "k": 2 }, "a": [5, 3, [{ "j": 4 }, { "k": 6 }]] });
    assert_eq!(values("$..j", &doc)?, vec![json!(1), json!(4)]);
    assert_eq!(values("$..[0]", &doc)?, vec![json!(5), json!({ "j": 4 })]);
    assert_eq!(values("$..o", &doc)?, vec![json!({ "j": 1, "k": 2 })]);
    assert_eq!(
        values("$.o..[*, *]", &doc)?,
        vec![json!(1), json!(2), json!(1), json!(2)]
    );
    assert_eq!(
        values("$.a..[0, 1]", &doc)?,
        vec![json!(5), json!(3), json!({ "j": 4 }), json!({ "k": 6 })]
    );
    Ok(())
}

#[test]
fn test_filter_examples() -> TestResult {
    init_logger();
    let doc = filter_document();
    assert_eq!(values("$.a[?@.b == 'kilo']", &doc)?, vec![json!({ "b": "kilo" })]);
    assert_eq!(values("$.a[?(@.b == 'kilo')]", &doc)?, vec![json!({ "b": "kilo" })]);
    assert_eq!(values("$.a[?@>3.5]", &doc)?, vec![json!(5), json!(4), json!(6)]);
    assert_eq!(values("$.a[?@.b]", &doc)?.len(), 4);
    assert_eq!(
        values("$[?@.*]", &doc)?,
        vec![doc["a"].clone(), doc["o"].clone()]
    );
    assert_eq!(values("$[?@[?@.b]]", &doc)?, vec![doc["a"].clone()]);
    assert_eq!(
        values("$.o[?@<3, ?@<3]", &doc)?,
        vec![json!(1), json!(2), json!(1), json!(2)]
    );
    assert_eq!(
        values(r#"$.a[?@<2 || @.b == "k"]"#, &doc)?,
        vec![json!(1), json!({ "b": "k" })]
    );
    assert_eq!(values("$.o[?@>1 && @<4]", &doc)?, vec![json!(2), json!(3)]);
    assert_eq!(values("$.o[?@.u || @.x]", &doc)?, vec![json!({ "u": 6 })]);
    assert_eq!(
        values("$.a[?@.b == $.x]", &doc)?,
        vec![json!(3), json!(5), json!(1), json!(2), json!(4), json!(6)]
    );
    assert_eq!(values("$.a[?@ == @]", &doc)?.len(), 10);
    Ok(())
}

#[test]
fn test_function_extensions() -> TestResult {
    init_logger();
    let doc = filter_document();
    assert_eq!(
        values(r#"$.a[?match(@.b, "[jk]")]"#, &doc)?,
        vec![json!({ "b": "j" }), json!({ "b": "k" })]
    );
    assert_eq!(
        values(r#"$.a[?search(@.b, "[jk]")]"#, &doc)?,
        vec![json!({ "b": "j" }), json!({ "b": "k" }), json!({ "b": "kilo" })]
    );

    let books = bookstore();
    assert_eq!(
        values("$.store.book[?length(@.author) > 12].author", &books)?,
        vec![json!("Herman Melville"), json!("J. R. R. Tolkien")]
    );
    assert_eq!(
        values("$.store[?value(@..color) == 'red']", &books)?,
        vec![json!({ "color": "red", "price": 399 })]
    );
    assert_eq!(
        values("$.store.book[?match(@.category, 'fic.*')].price", &books)?,
        vec![json!(12.99), json!(8.99), json!(22.99)]
    );
    Ok(())
}

#[test]
fn test_null_semantics() -> TestResult {
    init_logger();
    let doc = json!({ "a": null, "b": [null], "c": [{}], "null": 1 });
    assert_eq!(values("$.a", &doc)?, vec![json!(null)]);
    assert_eq!(values("$.a[0]", &doc)?, Vec::<serde_json::Value>::new());
    assert_eq!(values("$.a.d", &doc)?, Vec::<serde_json::Value>::new());
    assert_eq!(values("$.b[0]", &doc)?, vec![json!(null)]);
    assert_eq!(values("$.b[*]", &doc)?, vec![json!(null)]);
    assert_eq!(values("$.b[?@]", &doc)?, vec![json!(null)]);
    assert_eq!(values("$.b[?@==null]", &doc)?, vec![json!(null)]);
    assert_eq!(values("$.c[?@.d==null]", &doc)?, Vec::<serde_json::Value>::new());
    assert_eq!(values("$.null", &doc)?, vec![json!(1)]);
    Ok(())
}

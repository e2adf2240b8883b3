use doxa_core::db::open_db_in_memory;
use doxa_core::{
    DocumentRepository, NewDocument, NewRule, RepoError, RuleDomain, RuleRepository, RuleSort,
    RuleSortKey, SortDirection, SqliteDocumentRepository, SqliteRuleRepository,
};
use rusqlite::Connection;

const XML_DOC: i64 = 1;
const ETHER_DOC: i64 = 2;

/// Seeds one `xml` and one `ether` document, both with a cached report.
fn seed(conn: &Connection) {
    let docs = SqliteDocumentRepository::new(conn);
    docs.create_document(&NewDocument::new(XML_DOC, "d1", "c1", "new", "u", "d1.xml", "<a/>"))
        .unwrap();
    docs.create_document(&NewDocument::new(ETHER_DOC, "d2", "c1", "new", "u", "d2.xml", ""))
        .unwrap();
    docs.update_mode(ETHER_DOC, "ether").unwrap();
    mark_valid(conn);
}

fn mark_valid(conn: &Connection) {
    let docs = SqliteDocumentRepository::new(conn);
    docs.update_validation(XML_DOC, "valid").unwrap();
    docs.update_validation(ETHER_DOC, "valid").unwrap();
}

fn is_valid(conn: &Connection, id: i64) -> bool {
    SqliteDocumentRepository::new(conn)
        .get_document(id)
        .unwrap()
        .unwrap()
        .validation
        .is_some()
}

fn rule(domain: RuleDomain, name: &str) -> NewRule {
    NewRule::new("%", "%", domain, name, "exists", "")
}

#[test]
fn meta_rule_create_invalidates_every_document() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let rules = SqliteRuleRepository::new(&conn);

    rules.create_rule(&rule(RuleDomain::Meta, "author")).unwrap();

    assert!(!is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));
}

#[test]
fn non_meta_rule_create_invalidates_only_ether_documents() {
    for domain in [RuleDomain::Xml, RuleDomain::Ether, RuleDomain::Export] {
        let conn = open_db_in_memory().unwrap();
        seed(&conn);
        let rules = SqliteRuleRepository::new(&conn);

        rules.create_rule(&rule(domain, "span")).unwrap();

        assert!(is_valid(&conn, XML_DOC), "{domain} rule must keep xml docs");
        assert!(!is_valid(&conn, ETHER_DOC), "{domain} rule must clear ether docs");
    }
}

#[test]
fn update_rule_fans_out_by_domain() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let rules = SqliteRuleRepository::new(&conn);
    let id = rules.create_rule(&rule(RuleDomain::Xml, "span")).unwrap();

    mark_valid(&conn);
    rules
        .update_rule(id, &NewRule::new("d%", "c1", RuleDomain::Xml, "span", "~", "x"))
        .unwrap();
    assert!(is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));

    mark_valid(&conn);
    rules.update_rule(id, &rule(RuleDomain::Meta, "span")).unwrap();
    assert!(!is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));

    let stored = rules.get_validate_rules().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].domain, RuleDomain::Meta);
}

#[test]
fn moving_rule_out_of_meta_still_invalidates_every_document() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let rules = SqliteRuleRepository::new(&conn);
    let id = rules.create_rule(&rule(RuleDomain::Meta, "author")).unwrap();

    mark_valid(&conn);
    rules.update_rule(id, &rule(RuleDomain::Xml, "author")).unwrap();

    assert!(!is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));
}

#[test]
fn delete_rule_fans_out_by_stored_domain() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let rules = SqliteRuleRepository::new(&conn);
    let xml_id = rules.create_rule(&rule(RuleDomain::Xml, "span")).unwrap();
    let meta_id = rules.create_rule(&rule(RuleDomain::Meta, "author")).unwrap();

    mark_valid(&conn);
    assert!(rules.delete_rule(xml_id).unwrap());
    assert!(is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));

    mark_valid(&conn);
    assert!(rules.delete_rule(meta_id).unwrap());
    assert!(!is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));

    assert!(rules.get_validate_rules().unwrap().is_empty());
}

#[test]
fn deleting_missing_rule_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let rules = SqliteRuleRepository::new(&conn);

    assert!(!rules.delete_rule(404).unwrap());
    assert!(is_valid(&conn, XML_DOC));
    assert!(is_valid(&conn, ETHER_DOC));
}

#[test]
fn domain_accessors_partition_rules() {
    let conn = open_db_in_memory().unwrap();
    let rules = SqliteRuleRepository::new(&conn);
    rules.create_rule(&rule(RuleDomain::Xml, "x1")).unwrap();
    rules.create_rule(&rule(RuleDomain::Xml, "x2")).unwrap();
    rules.create_rule(&rule(RuleDomain::Meta, "m1")).unwrap();
    rules.create_rule(&rule(RuleDomain::Ether, "e1")).unwrap();
    rules.create_rule(&rule(RuleDomain::Export, "ex1")).unwrap();

    let names = |found: Vec<doxa_core::Rule>| -> Vec<String> {
        found.into_iter().map(|rule| rule.name).collect()
    };
    assert_eq!(names(rules.get_xml_rules().unwrap()), vec!["x1", "x2"]);
    assert_eq!(names(rules.get_meta_rules().unwrap()), vec!["m1"]);
    assert_eq!(names(rules.get_ether_rules().unwrap()), vec!["e1"]);
    assert_eq!(names(rules.get_export_rules().unwrap()), vec!["ex1"]);
    assert_eq!(rules.get_validate_rules().unwrap().len(), 5);
}

#[test]
fn stored_rule_keeps_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let rules = SqliteRuleRepository::new(&conn);
    let id = rules
        .create_rule(&NewRule::new("doc_%", "corp", RuleDomain::Ether, "col", "=", "sent"))
        .unwrap();

    let stored = &rules.get_ether_rules().unwrap()[0];
    assert_eq!(stored.id, id);
    assert_eq!(stored.doc, "doc_%");
    assert_eq!(stored.corpus, "corp");
    assert_eq!(stored.name, "col");
    assert_eq!(stored.operator, "=");
    assert_eq!(stored.argument, "sent");
}

#[test]
fn sorted_rules_follow_key_and_direction() {
    let conn = open_db_in_memory().unwrap();
    let rules = SqliteRuleRepository::new(&conn);
    for name in ["beta", "alpha", "gamma"] {
        rules.create_rule(&rule(RuleDomain::Xml, name)).unwrap();
    }

    let names = |sort: RuleSort| -> Vec<String> {
        rules
            .get_sorted_rules(sort)
            .unwrap()
            .into_iter()
            .map(|rule| rule.name)
            .collect()
    };

    assert_eq!(
        names(RuleSort::new(RuleSortKey::Name, SortDirection::Asc)),
        vec!["alpha", "beta", "gamma"]
    );
    assert_eq!(
        names("name DESC".parse().unwrap()),
        vec!["gamma", "beta", "alpha"]
    );
    assert_eq!(names(RuleSort::default()), vec!["beta", "alpha", "gamma"]);
}

#[test]
fn unknown_persisted_domain_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO validate (doc, corpus, domain, name, operator, argument)
         VALUES ('%', '%', 'schema', 'n', 'o', 'a')",
        [],
    )
    .unwrap();
    let rules = SqliteRuleRepository::new(&conn);

    let err = rules.get_validate_rules().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn rule_domain_filter_does_not_match_patterns() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let rules = SqliteRuleRepository::new(&conn);

    rules
        .create_rule(&NewRule::new("other", "elsewhere", RuleDomain::Meta, "n", "o", ""))
        .unwrap();

    // Fan-out is domain based; the rule's own doc/corpus patterns do not narrow it.
    assert!(!is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));
}

fn insert_raw_rule(conn: &Connection, domain: &str) -> i64 {
    conn.execute(
        "INSERT INTO validate (doc, corpus, domain, name, operator, argument)
         VALUES ('%', '%', ?1, 'n', 'o', 'a')",
        [domain],
    )
    .unwrap();
    conn.last_insert_rowid()
}

#[test]
fn rule_with_unmapped_domain_can_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let id = insert_raw_rule(&conn, "schema");
    let rules = SqliteRuleRepository::new(&conn);

    assert!(rules.delete_rule(id).unwrap());

    assert!(!is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));
    assert!(rules.get_validate_rules().unwrap().is_empty());
}

#[test]
fn rule_with_unmapped_domain_can_be_repaired() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let id = insert_raw_rule(&conn, "schema");
    let rules = SqliteRuleRepository::new(&conn);

    rules.update_rule(id, &rule(RuleDomain::Xml, "span")).unwrap();

    assert!(!is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));
    let stored = rules.get_validate_rules().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].domain, RuleDomain::Xml);
}

#[test]
fn differently_cased_domain_is_read_as_known_domain() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let id = insert_raw_rule(&conn, " XML ");
    let rules = SqliteRuleRepository::new(&conn);

    let xml = rules.get_xml_rules().unwrap();
    assert_eq!(xml.len(), 1);
    assert_eq!(xml[0].id, id);
    assert_eq!(rules.get_validate_rules().unwrap()[0].domain, RuleDomain::Xml);
    assert_eq!(rules.get_sorted_rules(RuleSort::default()).unwrap().len(), 1);

    assert!(rules.delete_rule(id).unwrap());
    assert!(is_valid(&conn, XML_DOC));
    assert!(!is_valid(&conn, ETHER_DOC));
}

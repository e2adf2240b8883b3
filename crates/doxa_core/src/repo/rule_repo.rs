//! Validation rule repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `validate` table.
//! - Feed rule sets to the external validation engine by domain.
//! - Fan invalidation out to every document a rule change can affect.
//!
//! # Invariants
//! - Every create/update/delete clears validation on the affected
//!   documents in the same scoped transaction as the rule write.
//! - Sorted listings only ever order by an enumerated column.
//! - A stored domain that maps to no known pass is treated as `meta` when
//!   fanning out invalidation, so such rows stay updatable and deletable.

use crate::db::{execute, run_scoped};
use crate::model::rule::{NewRule, Rule, RuleDomain, RuleId, RuleSort};
use crate::repo::doc_repo::{text, RepoError, RepoResult};
use crate::repo::invalidation::invalidate_for_rule_domain;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

const RULE_SELECT_SQL: &str = "SELECT corpus, doc, domain, name, operator, argument, id FROM validate";

/// Repository interface for validation rule operations.
pub trait RuleRepository {
    fn create_rule(&self, rule: &NewRule) -> RepoResult<RuleId>;
    /// Replaces every field of rule `id`.
    fn update_rule(&self, id: RuleId, rule: &NewRule) -> RepoResult<()>;
    /// Deletes rule `id`. Returns `false` when no such rule existed.
    fn delete_rule(&self, id: RuleId) -> RepoResult<bool>;
    fn get_validate_rules(&self) -> RepoResult<Vec<Rule>>;
    fn get_rules_for_domain(&self, domain: RuleDomain) -> RepoResult<Vec<Rule>>;
    fn get_sorted_rules(&self, sort: RuleSort) -> RepoResult<Vec<Rule>>;

    fn get_xml_rules(&self) -> RepoResult<Vec<Rule>> {
        self.get_rules_for_domain(RuleDomain::Xml)
    }

    fn get_meta_rules(&self) -> RepoResult<Vec<Rule>> {
        self.get_rules_for_domain(RuleDomain::Meta)
    }

    fn get_ether_rules(&self) -> RepoResult<Vec<Rule>> {
        self.get_rules_for_domain(RuleDomain::Ether)
    }

    fn get_export_rules(&self) -> RepoResult<Vec<Rule>> {
        self.get_rules_for_domain(RuleDomain::Export)
    }
}

/// SQLite-backed validation rule repository.
pub struct SqliteRuleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRuleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_rules<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<Rule>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut rules = Vec::new();
        while let Some(row) = rows.next()? {
            rules.push(parse_rule_row(row)?);
        }
        Ok(rules)
    }
}

impl RuleRepository for SqliteRuleRepository<'_> {
    fn create_rule(&self, rule: &NewRule) -> RepoResult<RuleId> {
        let (id, invalidated) = run_scoped(self.conn, |conn| {
            let id = execute(
                conn,
                "INSERT INTO validate (doc, corpus, domain, name, operator, argument)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    rule.doc.as_str(),
                    rule.corpus.as_str(),
                    rule.domain.as_str(),
                    rule.name.as_str(),
                    rule.operator.as_str(),
                    rule.argument.as_str(),
                ],
                true,
            )?
            .new_id()
            .ok_or_else(|| RepoError::InvalidData("rule insert returned no id".to_string()))?;
            let invalidated = invalidate_for_rule_domain(conn, rule.domain)?;
            Ok::<_, RepoError>((id, invalidated))
        })?;
        info!(
            "event=rule_create module=repo status=ok domain={} invalidated={}",
            rule.domain, invalidated
        );
        Ok(id)
    }

    fn update_rule(&self, id: RuleId, rule: &NewRule) -> RepoResult<()> {
        let invalidated = run_scoped(self.conn, |conn| {
            let previous = rule_domain_of(conn, id)?;
            conn.execute(
                "UPDATE validate
                 SET
                    doc = ?1,
                    corpus = ?2,
                    domain = ?3,
                    name = ?4,
                    operator = ?5,
                    argument = ?6
                 WHERE id = ?7;",
                params![
                    rule.doc.as_str(),
                    rule.corpus.as_str(),
                    rule.domain.as_str(),
                    rule.name.as_str(),
                    rule.operator.as_str(),
                    rule.argument.as_str(),
                    id,
                ],
            )?;

            // A rule moved out of `meta` still leaves stale meta results behind.
            let scope = match previous {
                Some(RuleDomain::Meta) => RuleDomain::Meta,
                _ => rule.domain,
            };
            Ok::<_, RepoError>(invalidate_for_rule_domain(conn, scope)?)
        })?;
        info!(
            "event=rule_update module=repo status=ok domain={} invalidated={}",
            rule.domain, invalidated
        );
        Ok(())
    }

    fn delete_rule(&self, id: RuleId) -> RepoResult<bool> {
        let outcome = run_scoped(self.conn, |conn| {
            let Some(domain) = rule_domain_of(conn, id)? else {
                return Ok::<_, RepoError>(None);
            };
            conn.execute("DELETE FROM validate WHERE id = ?1;", [id])?;
            let invalidated = invalidate_for_rule_domain(conn, domain)?;
            Ok(Some((domain, invalidated)))
        })?;

        match outcome {
            Some((domain, invalidated)) => {
                info!(
                    "event=rule_delete module=repo status=ok domain={} invalidated={}",
                    domain, invalidated
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get_validate_rules(&self) -> RepoResult<Vec<Rule>> {
        self.query_rules(&format!("{RULE_SELECT_SQL};"), [])
    }

    fn get_rules_for_domain(&self, domain: RuleDomain) -> RepoResult<Vec<Rule>> {
        self.query_rules(
            &format!("{RULE_SELECT_SQL} WHERE lower(trim(domain)) = ?1;"),
            [domain.as_str()],
        )
    }

    fn get_sorted_rules(&self, sort: RuleSort) -> RepoResult<Vec<Rule>> {
        // Tie-break on id so equal keys list in insertion order.
        self.query_rules(
            &format!(
                "{RULE_SELECT_SQL} ORDER BY {}, id ASC;",
                sort.order_by_clause()
            ),
            [],
        )
    }
}

/// Domain of rule `id` as far as invalidation is concerned.
fn rule_domain_of(conn: &Connection, id: RuleId) -> RepoResult<Option<RuleDomain>> {
    let domain: Option<Option<String>> = conn
        .query_row("SELECT domain FROM validate WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .optional()?;
    let Some(stored) = domain else {
        return Ok(None);
    };
    let stored = stored.unwrap_or_default();
    match stored.parse::<RuleDomain>() {
        Ok(domain) => Ok(Some(domain)),
        Err(_) => {
            warn!(
                "event=rule_domain module=repo status=unmapped id={} domain={:?} fallback=meta",
                id, stored
            );
            Ok(Some(RuleDomain::Meta))
        }
    }
}

fn parse_domain(value: &str) -> RepoResult<RuleDomain> {
    value.parse::<RuleDomain>().map_err(|_| {
        RepoError::InvalidData(format!("invalid rule domain `{value}` in validate.domain"))
    })
}

fn parse_rule_row(row: &Row<'_>) -> RepoResult<Rule> {
    let domain_text = text(row, "domain")?;
    Ok(Rule {
        id: row.get("id")?,
        doc: text(row, "doc")?,
        corpus: text(row, "corpus")?,
        domain: parse_domain(&domain_text)?,
        name: text(row, "name")?,
        operator: text(row, "operator")?,
        argument: text(row, "argument")?,
    })
}

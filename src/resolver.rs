use crate::error::ResolutionError;
use crate::parser::{FlattenedToken, TokenMap};
use crate::schema::parse_alias;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Display;

/// A flattened token together with the outcome of resolving its aliases.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedToken {
    #[serde(flatten)]
    pub token: FlattenedToken,
    pub original_value: Value,
    pub resolved_value: Value,
    pub is_resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_path: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub has_circular_reference: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_error: Option<ResolutionError>,
}

impl ResolvedToken {
    pub fn name(&self) -> &str {
        &self.token.name
    }

    /// Still carries an unresolved or circular reference.
    pub fn is_flagged(&self) -> bool {
        !self.is_resolved || self.has_circular_reference
    }
}

/// Ways an alias name is matched against the token set, cheapest first.
/// The later rungs are linear scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// `{colors-primary}` against token names.
    ExactName,
    /// `{colors.primary}` against dot-joined paths.
    DotPath,
    /// Dots rewritten to dashes, then retried.
    DotsToDashes,
    /// Dashes rewritten to dots, then retried.
    DashesToDots,
    /// Every path compared with dash/dot and ASCII case differences ignored.
    PathScan,
    /// Only the last segment of the alias compared with each token's last segment.
    TrailingSegment,
}

impl LookupStrategy {
    pub const LADDER: [LookupStrategy; 6] = [
        LookupStrategy::ExactName,
        LookupStrategy::DotPath,
        LookupStrategy::DotsToDashes,
        LookupStrategy::DashesToDots,
        LookupStrategy::PathScan,
        LookupStrategy::TrailingSegment,
    ];
}

/// Intermediate result of resolving one value, possibly nested inside a composite.
struct Outcome {
    value: Value,
    error: Option<ResolutionError>,
    reference_path: Option<String>,
    circular: bool,
    /// Alias strings that could not be resolved anywhere inside this value.
    failed: Vec<String>,
}

impl Outcome {
    fn literal(value: &Value) -> Self {
        Outcome {
            value: value.clone(),
            error: None,
            reference_path: None,
            circular: false,
            failed: Vec::new(),
        }
    }

    fn failed(raw: &str, error: ResolutionError, circular: bool) -> Self {
        Outcome {
            value: Value::String(raw.to_string()),
            error: Some(error),
            reference_path: None,
            circular,
            failed: vec![raw.to_string()],
        }
    }
}

/// One open token on the resolver's work stack.
struct Frame {
    index: usize,
    /// Alias targets found in the token's value, in first-seen order.
    targets: Vec<usize>,
    next: usize,
}

/// Resolves aliases across one flat token set.
///
/// Tokens live in an arena addressed by index; the memo and the in-progress
/// stack are keyed by that index. A resolver is meant to serve one request:
/// build a fresh one from the current token set each time.
pub struct Resolver<'a> {
    tokens: Vec<&'a FlattenedToken>,
    by_name: HashMap<&'a str, usize>,
    by_path: HashMap<String, usize>,
    memo: Vec<Option<ResolvedToken>>,
    in_progress: Vec<bool>,
    stack: Vec<usize>,
}

impl<'a> Resolver<'a> {
    pub fn new(tokens: &'a TokenMap) -> Self {
        Self::from_tokens(tokens.values())
    }

    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a FlattenedToken>,
    {
        let tokens: Vec<&'a FlattenedToken> = tokens.into_iter().collect();
        let mut by_name = HashMap::with_capacity(tokens.len());
        let mut by_path = HashMap::with_capacity(tokens.len());
        for (index, token) in tokens.iter().copied().enumerate() {
            by_name.insert(token.name.as_str(), index);
            by_path.insert(token.dot_path(), index);
        }
        let count = tokens.len();
        Resolver {
            tokens,
            by_name,
            by_path,
            memo: vec![None; count],
            in_progress: vec![false; count],
            stack: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Finds the token an alias name refers to, walking [`LookupStrategy::LADDER`].
    pub fn lookup(&self, reference: &str) -> Option<(&'a FlattenedToken, LookupStrategy)> {
        self.lookup_index(reference)
            .map(|(index, strategy)| (self.tokens[index], strategy))
    }

    fn lookup_index(&self, reference: &str) -> Option<(usize, LookupStrategy)> {
        let found = LookupStrategy::LADDER
            .into_iter()
            .find_map(|strategy| self.find_with(strategy, reference).map(|i| (i, strategy)));
        if let Some((index, strategy)) = found {
            if strategy != LookupStrategy::ExactName && strategy != LookupStrategy::DotPath {
                log::trace!(
                    "reference `{reference}` matched `{}` via {strategy:?}",
                    self.tokens[index].name
                );
            }
        }
        found
    }

    fn find_with(&self, strategy: LookupStrategy, reference: &str) -> Option<usize> {
        match strategy {
            LookupStrategy::ExactName => self.by_name.get(reference).copied(),
            LookupStrategy::DotPath => self.by_path.get(reference).copied(),
            LookupStrategy::DotsToDashes => {
                let dashed = reference.replace('.', "-");
                self.by_name
                    .get(dashed.as_str())
                    .or_else(|| self.by_path.get(&dashed))
                    .copied()
            }
            LookupStrategy::DashesToDots => {
                let dotted = reference.replace('-', ".");
                self.by_path
                    .get(&dotted)
                    .or_else(|| self.by_name.get(dotted.as_str()))
                    .copied()
            }
            LookupStrategy::PathScan => {
                let wanted = reference.replace('-', ".");
                self.tokens
                    .iter()
                    .position(|token| token.dot_path().replace('-', ".").eq_ignore_ascii_case(&wanted))
            }
            LookupStrategy::TrailingSegment => {
                let by_dot = reference.rsplit('.').next().unwrap_or(reference);
                let by_dash = reference.rsplit('-').next().unwrap_or(reference);
                self.tokens.iter().position(|token| {
                    token
                        .path
                        .last()
                        .is_some_and(|last| last == by_dot || last == by_dash)
                })
            }
        }
    }

    /// Resolves every token, in arena order.
    pub fn resolve_all(&mut self) -> Vec<ResolvedToken> {
        let resolved: Vec<ResolvedToken> = (0..self.tokens.len())
            .map(|index| self.resolve_index(index))
            .collect();
        let summary = ResolutionSummary::from_tokens(&resolved);
        log::debug!("{summary}");
        resolved
    }

    /// Resolves a single token by its name or dot path, or `None` if no token
    /// has it. The fallback rungs of the lookup ladder apply to alias targets
    /// only.
    pub fn resolve_one(&mut self, name: &str) -> Option<ResolvedToken> {
        let index = self
            .by_name
            .get(name)
            .or_else(|| self.by_path.get(name))
            .copied()?;
        Some(self.resolve_index(index))
    }

    /// Resolves one token with an explicit work stack, so chain length is bounded
    /// by the token count rather than the thread's stack size. Every alias target
    /// is memoized before the token that refers to it is evaluated.
    fn resolve_index(&mut self, index: usize) -> ResolvedToken {
        if let Some(done) = &self.memo[index] {
            return done.clone();
        }

        let mut frames = vec![self.enter(index)];
        while let Some(frame) = frames.last_mut() {
            if let Some(&target) = frame.targets.get(frame.next) {
                frame.next += 1;
                if self.memo[target].is_some() {
                    continue;
                }
                if self.in_progress[target] {
                    self.mark_cycle(target);
                    continue;
                }
                let entered = self.enter(target);
                frames.push(entered);
                continue;
            }

            let current = frame.index;
            frames.pop();
            self.in_progress[current] = false;
            self.stack.pop();
            self.finish(current);
        }

        match &self.memo[index] {
            Some(resolved) => resolved.clone(),
            None => self.evaluate(index),
        }
    }

    fn enter(&mut self, index: usize) -> Frame {
        self.stack.push(index);
        self.in_progress[index] = true;
        let mut targets = Vec::new();
        self.collect_targets(&self.tokens[index].value, &mut targets);
        Frame {
            index,
            targets,
            next: 0,
        }
    }

    fn collect_targets(&self, value: &Value, targets: &mut Vec<usize>) {
        match value {
            Value::String(raw) => {
                if let Some((target, _)) = parse_alias(raw).and_then(|r| self.lookup_index(r)) {
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|item| self.collect_targets(item, targets)),
            Value::Object(fields) => fields
                .values()
                .for_each(|field| self.collect_targets(field, targets)),
            _ => {}
        }
    }

    /// Memoizes a token whose targets are all settled. A cycle found while its
    /// frame was open has already marked it; that mark is kept.
    fn finish(&mut self, index: usize) {
        let circular = self.memo[index]
            .as_ref()
            .is_some_and(|done| done.has_circular_reference);
        if !circular {
            let resolved = self.evaluate(index);
            self.memo[index] = Some(resolved);
        }
    }

    fn evaluate(&self, index: usize) -> ResolvedToken {
        let token = self.tokens[index];
        let outcome = self.resolve_value(&token.value);
        ResolvedToken {
            token: token.clone(),
            original_value: token.value.clone(),
            resolved_value: outcome.value,
            is_resolved: outcome.error.is_none(),
            reference_path: outcome.reference_path,
            has_circular_reference: outcome.circular,
            resolution_error: outcome.error,
        }
    }

    fn resolve_value(&self, value: &Value) -> Outcome {
        match value {
            Value::String(raw) => match parse_alias(raw) {
                Some(reference) => self.resolve_reference(reference, raw),
                None if raw.starts_with('{') => {
                    Outcome::failed(raw, ResolutionError::MalformedAlias(raw.clone()), false)
                }
                None => Outcome::literal(value),
            },
            Value::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                let mut combined = Outcome::literal(&Value::Null);
                for item in items {
                    let outcome = self.resolve_value(item);
                    resolved.push(merge_child(&mut combined, outcome));
                }
                combined.value = Value::Array(resolved);
                finish_composite(combined)
            }
            Value::Object(fields) => {
                let mut resolved = Map::with_capacity(fields.len());
                let mut combined = Outcome::literal(&Value::Null);
                for (key, field) in fields {
                    let outcome = self.resolve_value(field);
                    resolved.insert(key.clone(), merge_child(&mut combined, outcome));
                }
                combined.value = Value::Object(resolved);
                finish_composite(combined)
            }
            _ => Outcome::literal(value),
        }
    }

    /// Reads an alias target from the memo; [`Resolver::resolve_index`] has
    /// settled it already.
    fn resolve_reference(&self, reference: &str, raw: &str) -> Outcome {
        let Some((target, _)) = self.lookup_index(reference) else {
            log::warn!("reference {raw} does not match any token");
            return Outcome::failed(raw, ResolutionError::NotFound(reference.to_string()), false);
        };

        let Some(referent) = &self.memo[target] else {
            return Outcome::failed(
                raw,
                ResolutionError::Unresolved {
                    reference: reference.to_string(),
                    reason: "referenced token is unresolved".to_string(),
                },
                self.in_progress[target],
            );
        };

        if referent.is_resolved {
            return Outcome {
                value: referent.resolved_value.clone(),
                error: None,
                reference_path: Some(reference.to_string()),
                circular: false,
                failed: Vec::new(),
            };
        }

        let reason = referent
            .resolution_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "referenced token is unresolved".to_string());
        Outcome::failed(
            raw,
            ResolutionError::Unresolved {
                reference: reference.to_string(),
                reason,
            },
            referent.has_circular_reference,
        )
    }

    /// Marks every token on the stack as circular. `target` is the token being
    /// revisited.
    fn mark_cycle(&mut self, target: usize) {
        let chain: Vec<String> = self
            .stack
            .iter()
            .chain(std::iter::once(&target))
            .map(|&index| self.tokens[index].name.clone())
            .collect();
        log::warn!("circular reference: {}", chain.join(" → "));

        let error = ResolutionError::Circular { chain };
        for &index in &self.stack {
            let token = self.tokens[index];
            self.memo[index] = Some(ResolvedToken {
                token: token.clone(),
                original_value: token.value.clone(),
                resolved_value: token.value.clone(),
                is_resolved: false,
                reference_path: None,
                has_circular_reference: true,
                resolution_error: Some(error.clone()),
            });
        }
    }
}

/// Folds a child outcome into its composite parent and returns the value to
/// place at the child's position: the resolved value, or the original alias
/// string if it failed.
fn merge_child(parent: &mut Outcome, child: Outcome) -> Value {
    parent.circular |= child.circular;
    parent.failed.extend(child.failed);
    if child.error.is_some() && parent.error.is_none() {
        parent.error = child.error;
    }
    child.value
}

fn finish_composite(mut combined: Outcome) -> Outcome {
    if combined.error.is_some() {
        combined.error = Some(ResolutionError::Composite {
            failed: combined.failed.clone(),
        });
    }
    combined
}

/// Every token that still carries an unresolved or circular reference.
pub fn unresolved_tokens(tokens: &[ResolvedToken]) -> Vec<&ResolvedToken> {
    tokens.iter().filter(|t| t.is_flagged()).collect()
}

pub fn circular_tokens(tokens: &[ResolvedToken]) -> Vec<&ResolvedToken> {
    tokens.iter().filter(|t| t.has_circular_reference).collect()
}

/// Counts for health-check style reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub total: usize,
    pub resolved: usize,
    pub flagged: usize,
    pub circular: usize,
}

impl ResolutionSummary {
    pub fn from_tokens(tokens: &[ResolvedToken]) -> Self {
        let flagged = tokens.iter().filter(|t| t.is_flagged()).count();
        ResolutionSummary {
            total: tokens.len(),
            resolved: tokens.len() - flagged,
            flagged,
            circular: tokens.iter().filter(|t| t.has_circular_reference).count(),
        }
    }
}

impl Display for ResolutionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tokens resolved successfully, {} flagged",
            self.resolved, self.flagged
        )?;
        if self.circular > 0 {
            write!(f, " ({} circular)", self.circular)?;
        }
        Ok(())
    }
}

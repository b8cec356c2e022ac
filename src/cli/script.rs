//! Edit scripts: a line-oriented command language driving an [`EditSession`]
//!
//! ```text
//! add <node> [key=value ...]
//! remove <node>
//! set <node> <key> <value...>
//! eval-add <node>
//! eval-rm <node> <index>
//! eval-set <node> <index> <key> <value...>
//! show
//! ids
//! ```
//!
//! Nodes are referenced as `/` (root), `/0/1` (child-index path), `#a1b2`
//! (id suffix) or a full UUID. Blank lines and lines starting with `#` are
//! skipped.

use std::io::Write;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, EditSession};
use crate::cli::error::{CliError, CliResult};
use crate::domain::{self, NodeId, Properties};
use crate::tree_traits::TreeNodeConvert;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Add {
        node: String,
        properties: Option<Properties>,
    },
    Remove {
        node: String,
    },
    Set {
        node: String,
        key: String,
        value: String,
    },
    EvalAdd {
        node: String,
    },
    EvalRemove {
        node: String,
        index: usize,
    },
    EvalSet {
        node: String,
        index: usize,
        key: String,
        value: String,
    },
    Show,
    Ids,
}

/// Split off the first whitespace-delimited word.
fn take_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], input[end..].trim_start()))
}

fn word<'a>(rest: &mut &'a str, what: &str) -> Result<&'a str, String> {
    let (w, tail) = take_word(rest).ok_or_else(|| format!("missing {what}"))?;
    *rest = tail;
    Ok(w)
}

fn index(raw: &str) -> Result<usize, String> {
    raw.parse()
        .map_err(|_| format!("invalid evaluation index: {raw}"))
}

fn no_more(rest: &str) -> Result<(), String> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(format!("unexpected arguments: {}", rest.trim()))
    }
}

/// Parse one script line; `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<EditCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut rest = line;
    let command = word(&mut rest, "command")?;

    let parsed = match command {
        "add" => {
            let node = word(&mut rest, "node")?.to_string();
            let properties = if rest.is_empty() {
                None
            } else {
                let pairs = rest
                    .split_whitespace()
                    .map(|pair| {
                        pair.split_once('=')
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .ok_or_else(|| format!("expected key=value, got: {pair}"))
                    })
                    .collect::<Result<Properties, String>>()?;
                Some(pairs)
            };
            EditCommand::Add { node, properties }
        }
        "remove" => {
            let node = word(&mut rest, "node")?.to_string();
            no_more(rest)?;
            EditCommand::Remove { node }
        }
        "set" => {
            let node = word(&mut rest, "node")?.to_string();
            let key = word(&mut rest, "key")?.to_string();
            EditCommand::Set {
                node,
                key,
                value: rest.to_string(),
            }
        }
        "eval-add" => {
            let node = word(&mut rest, "node")?.to_string();
            no_more(rest)?;
            EditCommand::EvalAdd { node }
        }
        "eval-rm" => {
            let node = word(&mut rest, "node")?.to_string();
            let index = index(word(&mut rest, "index")?)?;
            no_more(rest)?;
            EditCommand::EvalRemove { node, index }
        }
        "eval-set" => {
            let node = word(&mut rest, "node")?.to_string();
            let index = index(word(&mut rest, "index")?)?;
            let key = word(&mut rest, "key")?.to_string();
            EditCommand::EvalSet {
                node,
                index,
                key,
                value: rest.to_string(),
            }
        }
        "show" => {
            no_more(rest)?;
            EditCommand::Show
        }
        "ids" => {
            no_more(rest)?;
            EditCommand::Ids
        }
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(parsed))
}

/// Parse a whole script, numbering lines from 1.
pub fn parse_script(text: &str) -> CliResult<Vec<(usize, EditCommand)>> {
    let mut commands = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if let Some(command) =
            parse_line(line).map_err(|message| CliError::Script { line: line_no, message })?
        {
            commands.push((line_no, command));
        }
    }
    Ok(commands)
}

/// What applying one command did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The tree changed
    Changed,
    /// The tree value is the same (stale target or read-only command)
    Unchanged,
    /// The node reference did not resolve; nothing was attempted
    Skipped(String),
}

/// Applies parsed commands to a session, writing `show`/`ids` output to `out`.
pub struct ScriptRunner<'s> {
    session: &'s mut EditSession,
    short_id_len: usize,
}

impl<'s> ScriptRunner<'s> {
    pub fn new(session: &'s mut EditSession, short_id_len: usize) -> Self {
        Self {
            session,
            short_id_len,
        }
    }

    fn resolve(&self, reference: &str) -> CliResult<Result<NodeId, String>> {
        match self.session.resolve(reference) {
            Ok(id) => Ok(Ok(id)),
            Err(e @ (ApplicationError::UnknownNode(_) | ApplicationError::AmbiguousNode { .. })) => {
                Ok(Err(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply one command.
    ///
    /// Unresolvable references are reported as [`Outcome::Skipped`]; an
    /// out-of-range evaluation index is an error.
    #[instrument(level = "debug", skip(self, out))]
    pub fn apply(&mut self, command: &EditCommand, out: &mut impl Write) -> CliResult<Outcome> {
        let node_ref = match command {
            EditCommand::Add { node, .. }
            | EditCommand::Remove { node }
            | EditCommand::Set { node, .. }
            | EditCommand::EvalAdd { node }
            | EditCommand::EvalRemove { node, .. }
            | EditCommand::EvalSet { node, .. } => Some(node.as_str()),
            EditCommand::Show | EditCommand::Ids => None,
        };
        let target = match node_ref.map(|r| self.resolve(r)).transpose()? {
            Some(Ok(id)) => Some(id),
            Some(Err(reason)) => return Ok(Outcome::Skipped(reason)),
            None => None,
        };
        debug!(?target, "applying command");

        let changed = match (command, target) {
            (EditCommand::Add { properties, .. }, Some(parent)) => {
                let added = match properties {
                    Some(props) => self
                        .session
                        .add_child_with_properties(&parent, props.clone())?,
                    None => self.session.add_child(&parent)?,
                };
                added.is_some()
            }
            (EditCommand::Remove { .. }, Some(child)) => self.session.remove(&child),
            (EditCommand::Set { key, value, .. }, Some(node)) => {
                self.session.set_property(&node, key, value)
            }
            (EditCommand::EvalAdd { .. }, Some(node)) => self.session.add_evaluation(&node),
            (EditCommand::EvalRemove { index, .. }, Some(node)) => {
                self.session.remove_evaluation(&node, *index)?
            }
            (
                EditCommand::EvalSet {
                    index, key, value, ..
                },
                Some(node),
            ) => self
                .session
                .set_evaluation_field(&node, *index, key, value)?,
            (EditCommand::Show, _) => {
                let rendered = self.session.tree().to_tree_string(self.short_id_len);
                write!(out, "{rendered}").map_err(|e| CliError::io("write tree", e))?;
                false
            }
            (EditCommand::Ids, _) => {
                let ids = domain::list_ids(self.session.tree())
                    .iter()
                    .map(|id| id.short(self.short_id_len))
                    .join(" ");
                writeln!(out, "{ids}").map_err(|e| CliError::io("write ids", e))?;
                false
            }
            (_, None) => false,
        };

        Ok(if changed {
            Outcome::Changed
        } else {
            Outcome::Unchanged
        })
    }
}

//! Tests for edit scripts run against a session with sequential ids

use rstest::{fixture, rstest};

use proctree::application::EditSession;
use proctree::cli::script::{parse_line, parse_script, EditCommand, Outcome, ScriptRunner};
use proctree::cli::CliError;
use proctree::config::Templates;
use proctree::domain::{fields, list_ids, SequentialIds};
use proctree::exitcode;
use proctree::util::testing;

#[fixture]
fn session() -> EditSession {
    testing::init_test_setup();
    EditSession::new(Templates::default(), Box::new(SequentialIds::new()))
}

/// Run every line, collecting outcomes and the text written by show/ids.
fn run(session: &mut EditSession, script: &str) -> (Vec<Outcome>, String) {
    let commands = parse_script(script).unwrap();
    let mut out = Vec::new();
    let mut runner = ScriptRunner::new(session, 4);
    let outcomes = commands
        .iter()
        .map(|(_, command)| runner.apply(command, &mut out).unwrap())
        .collect();
    (outcomes, String::from_utf8(out).unwrap())
}

#[rstest]
fn given_script_when_adding_by_path_then_tree_grows(mut session: EditSession) {
    let (outcomes, out) = run(
        &mut session,
        "add /\nadd / step=cut\nadd /1 tool=saw\nids\n",
    );

    assert_eq!(
        outcomes,
        vec![
            Outcome::Changed,
            Outcome::Changed,
            Outcome::Changed,
            Outcome::Unchanged
        ]
    );
    assert_eq!(out, "0001 0002 0003 0004\n");
    let tree = session.tree();
    assert_eq!(tree.children()[1].properties(), &fields([("step", "cut")]));
    assert_eq!(
        tree.children()[1].children()[0].properties(),
        &fields([("tool", "saw")])
    );
}

#[rstest]
fn given_suffix_reference_when_setting_then_value_keeps_spaces(mut session: EditSession) {
    let (outcomes, _) = run(&mut session, "add /\nset #0002 text cut along   the line\n");

    assert_eq!(outcomes, vec![Outcome::Changed, Outcome::Changed]);
    assert_eq!(
        session.tree().children()[0].properties()["text"],
        "cut along   the line"
    );
}

#[rstest]
fn given_unknown_reference_when_applying_then_skipped(mut session: EditSession) {
    let (outcomes, _) = run(&mut session, "remove /4\nset #ffff k v\n");

    assert!(matches!(outcomes[0], Outcome::Skipped(_)));
    assert!(matches!(outcomes[1], Outcome::Skipped(_)));
    assert_eq!(session.revision(), 0);
}

#[rstest]
fn given_full_id_when_removing_then_child_gone_and_root_stays(mut session: EditSession) {
    run(&mut session, "add /\n");
    let child = list_ids(session.tree())[1].to_string();

    let script = format!("remove {child}\nremove /\n");
    let (outcomes, _) = run(&mut session, &script);

    // the root is never removed
    assert_eq!(outcomes[0], Outcome::Changed);
    assert_eq!(outcomes[1], Outcome::Unchanged);
    assert_eq!(list_ids(session.tree()).len(), 1);
}

#[rstest]
fn given_evaluation_commands_when_applying_then_records_edited(mut session: EditSession) {
    let (outcomes, _) = run(
        &mut session,
        "eval-add /\neval-set / 1 test 7\neval-rm / 0\n",
    );

    assert_eq!(outcomes, vec![Outcome::Changed; 3]);
    assert_eq!(
        session.tree().evaluations(),
        &[fields([("evaluation", "template"), ("test", "7")])]
    );
}

#[rstest]
fn given_out_of_range_index_when_applying_then_domain_error(mut session: EditSession) {
    let command = parse_line("eval-rm / 3").unwrap().unwrap();
    let mut runner = ScriptRunner::new(&mut session, 4);

    let err = runner.apply(&command, &mut Vec::<u8>::new()).unwrap_err();

    assert!(matches!(err, CliError::Application(_)));
    assert_eq!(err.exit_code(), exitcode::SOFTWARE);
    assert_eq!(session.tree().evaluations().len(), 1);
}

#[rstest]
fn given_show_when_applying_then_renders_tree(mut session: EditSession) {
    let (_, out) = run(&mut session, "add /\nshow\n");

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("root #0001 (branches: 1 max depth: 1)"));
    assert!(lines[1].ends_with("child #0002 {complex=patterns, test=content, text=default}"));
}

#[test]
fn given_comment_and_blank_lines_when_parsing_then_line_numbers_preserved() {
    let commands = parse_script("# setup\n\nadd /\n  \nshow\n").unwrap();

    let lines: Vec<usize> = commands.iter().map(|(line, _)| *line).collect();
    assert_eq!(lines, vec![3, 5]);
    assert_eq!(commands[1].1, EditCommand::Show);
}

#[test]
fn given_parse_failure_when_reporting_then_data_error_exit_code() {
    let err = parse_script("add /\neval-rm /\n").unwrap_err();
    assert!(matches!(err, CliError::Script { line: 2, .. }));
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

use std::io;

use regex::Regex;

use crate::board::Point;

/// One command from the player. `Auto` hands the move to the session's
/// injected selector, the keyboard shortcut the windowed build had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Click(Point),
    Flag(Point),
    Auto,
    Quit,
}

/// Prompts until the player produces a well-formed, on-board action.
/// EOF or a broken stdin reads as quitting.
pub fn read_action(rows: usize, columns: usize) -> Action {
    loop {
        println!("move (click R C | flag R C | auto | quit):");
        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => return Action::Quit,
            Ok(_) => {}
        }
        match parse_action(&input) {
            Some(action) if action_in_bounds(action, rows, columns) => return action,
            Some(_) => println!("that cell is off the board"),
            None => println!("must be of the form: click R C"),
        }
    }
}

fn parse_action(input: &str) -> Option<Action> {
    let input = input.trim();
    if input == "auto" {
        return Some(Action::Auto);
    }
    if input == "quit" {
        return Some(Action::Quit);
    }
    let re = Regex::new(r"^(click|flag)\s+(\d+)\s+(\d+)$").unwrap();
    let cap = re.captures(input)?;
    let row: usize = cap[2].parse().ok()?;
    let column: usize = cap[3].parse().ok()?;
    let point = Point(row, column);
    match &cap[1] {
        "click" => Some(Action::Click(point)),
        "flag" => Some(Action::Flag(point)),
        _ => None,
    }
}

fn action_in_bounds(action: Action, rows: usize, columns: usize) -> bool {
    match action {
        Action::Click(point) | Action::Flag(point) => point.0 < rows && point.1 < columns,
        Action::Auto | Action::Quit => true,
    }
}

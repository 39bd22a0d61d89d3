//! Edit script parsing.
//!
//! One command per line, arguments separated by whitespace. Double quotes
//! group an argument containing spaces. `#` starts a comment line.
//!
//! ```text
//! create lamp light
//! set lamp _light "255 255 255 200"
//! group lights lamp
//! undo
//! print
//! ```

use crate::config::{EditorError, EditorResult};

/// One scripted editor operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `create <name> <classname> [parent]`
    Create {
        name: String,
        classname: String,
        parent: Option<String>,
    },
    /// `set <name> <key> <value>`
    Set {
        name: String,
        key: String,
        value: String,
    },
    /// `move <name> <parent>`
    Move { name: String, parent: String },
    /// `delete <name>`
    Delete { name: String },
    /// `group <group> <name>...`
    Group { name: String, members: Vec<String> },
    /// `select [name]...`
    Select { names: Vec<String> },
    Undo,
    Redo,
    /// `print`: dump the world tree.
    Print,
    /// `history`: list undo and redo tracks.
    History,
}

/// Parses a whole script, reporting the first bad line.
pub fn parse_script(source: &str) -> EditorResult<Vec<(usize, Command)>> {
    let mut commands = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        let parsed = parse_line(line).map_err(|message| EditorError::Parse {
            line: line_no,
            message,
        })?;
        if let Some(command) = parsed {
            commands.push((line_no, command));
        }
    }
    Ok(commands)
}

/// Parses one line. Blank and comment lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let tokens = tokenize(trimmed)?;
    let Some((verb, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match (verb.as_str(), args) {
        ("create", [name, classname]) => Command::Create {
            name: name.clone(),
            classname: classname.clone(),
            parent: None,
        },
        ("create", [name, classname, parent]) => Command::Create {
            name: name.clone(),
            classname: classname.clone(),
            parent: Some(parent.clone()),
        },
        ("set", [name, key, value]) => Command::Set {
            name: name.clone(),
            key: key.clone(),
            value: value.clone(),
        },
        ("move", [name, parent]) => Command::Move {
            name: name.clone(),
            parent: parent.clone(),
        },
        ("delete", [name]) => Command::Delete { name: name.clone() },
        ("group", [name, members @ ..]) if !members.is_empty() => Command::Group {
            name: name.clone(),
            members: members.to_vec(),
        },
        ("select", names) => Command::Select {
            names: names.to_vec(),
        },
        ("undo", []) => Command::Undo,
        ("redo", []) => Command::Redo,
        ("print", []) => Command::Print,
        ("history", []) => Command::History,
        (
            "create" | "set" | "move" | "delete" | "group" | "undo" | "redo" | "print"
            | "history",
            _,
        ) => {
            return Err(format!("wrong number of arguments to \"{verb}\""));
        }
        (other, _) => return Err(format!("unknown command \"{other}\"")),
    };
    Ok(Some(command))
}

fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quoted {
        return Err("unterminated quote".into());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

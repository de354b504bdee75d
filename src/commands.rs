/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "projects",
    aliases: &["p", "project"],
    description: "Browse projects",
  },
  Command {
    name: "tasks",
    aliases: &["t", "task", "all"],
    description: "Tasks across every project",
  },
  Command {
    name: "team",
    aliases: &["o", "orgs", "organizations", "members"],
    description: "Organizations, members and invitations",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Drop cached data and refetch",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit taskdeck",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if cmd.name == input_lower {
      matches.push((cmd, 0));
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
    } else if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
    } else if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Stable, so ties keep declaration order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Resolve what the user typed to a command name, preferring the highlighted suggestion
pub fn resolve(input: &str, selected_suggestion: usize) -> Option<&'static str> {
  get_suggestions(input)
    .get(selected_suggestion)
    .map(|cmd| cmd.name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("tasks");
    assert_eq!(suggestions[0].name, "tasks");
  }

  #[test]
  fn test_alias_match() {
    assert_eq!(get_suggestions("r")[0].name, "refresh");
    assert_eq!(get_suggestions("all")[0].name, "tasks");
    assert_eq!(get_suggestions("orgs")[0].name, "team");
  }

  #[test]
  fn test_prefix_match() {
    assert_eq!(get_suggestions("pro")[0].name, "projects");
    assert_eq!(get_suggestions("te")[0].name, "team");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("jec");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].name, "projects");
  }

  #[test]
  fn test_resolve() {
    assert_eq!(resolve("q", 0), Some("quit"));
    assert_eq!(resolve("", 1), Some("tasks"));
    assert_eq!(resolve("zzz", 0), None);
  }
}

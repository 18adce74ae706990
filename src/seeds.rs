//! Built-in catalog: the challenge bank and the badge table.
//!
//! Script reference solutions are written as single-line literals of the expected
//! output. They normalize to the same text as the real program output, and they
//! also pass when submitted as code themselves (the catalog self-check relies on it).

use crate::domain::{Badge, BadgeTrigger, Category, Challenge, Level};

#[allow(clippy::too_many_arguments)]
fn challenge(
  id: &str,
  title: &str,
  description: &str,
  category: Category,
  level: Level,
  initial_code: &str,
  solution: &str,
  points: u32,
) -> Challenge {
  Challenge {
    id: id.into(),
    title: title.into(),
    description: description.into(),
    category,
    level,
    initial_code: initial_code.into(),
    solution: solution.into(),
    points,
  }
}

/// Three challenges per (category, level) so that every category badge has
/// something to complete.
pub fn seed_challenges() -> Vec<Challenge> {
  use Category::{MarkupStyle as Markup, ScriptLanguage as Script};
  use Level::{Beginner, Expert, Intermediate};

  vec![
    // --- Python, beginner ---
    challenge("py-hello", "Hello, World!", "Print the classic greeting: Hello, World!",
      Script, Beginner, "# Print the greeting below\n", "\"Hello, World!\"", 100),
    challenge("py-variables", "Variables", "Store the name \"Ada\" and the age 36 in variables, then print both with one print call.",
      Script, Beginner, "name = \nage = \n", "\"Ada 36\"", 100),
    challenge("py-arithmetic", "Multiplication", "Print the result of 7 multiplied by 6.",
      Script, Beginner, "# Use the * operator\n", "42", 100),

    // --- Python, intermediate ---
    challenge("py-fstring", "Formatted strings", "With name = \"Sam\" and score = 8, print: Sam scored 8 points (use an f-string).",
      Script, Intermediate, "name = \"Sam\"\nscore = 8\n", "\"Sam scored 8 points\"", 150),
    challenge("py-lists", "Growing a list", "Start from ['apple', 'pear', 'fig'], append 'kiwi', then print the length of the list.",
      Script, Intermediate, "fruits = ['apple', 'pear', 'fig']\n", "4", 150),
    challenge("py-string-methods", "Shouting", "Print the word python in upper case using a string method.",
      Script, Intermediate, "word = \"python\"\n", "\"PYTHON\"", 150),

    // --- Python, expert ---
    challenge("py-reverse", "Backwards", "Print the string \"level up\" reversed using slicing.",
      Script, Expert, "text = \"level up\"\n", "\"pu level\"", 250),
    challenge("py-sum-range", "Gauss", "Print the sum of all integers from 1 to 100 using sum() and range().",
      Script, Expert, "", "5050", 250),
    challenge("py-sorted", "Sorting", "Print the list [5, 3, 9, 1] sorted in ascending order.",
      Script, Expert, "numbers = [5, 3, 9, 1]\n", "[1, 3, 5, 9]", 250),

    // --- HTML/CSS, beginner ---
    challenge("html-heading", "First heading", "Write a level-one heading containing the text Hello.",
      Markup, Beginner, "<!-- your heading -->\n", "<h1>Hello</h1>", 100),
    challenge("html-link", "Links", "Create a link to https://example.com with the text Visit.",
      Markup, Beginner, "<a></a>\n", "<a href=\"https://example.com\">Visit</a>", 100),
    challenge("html-image", "Images", "Display the image logo.png.",
      Markup, Beginner, "<img>\n", "<img src=\"logo.png\">", 100),

    // --- HTML/CSS, intermediate ---
    challenge("html-list", "Lists", "Build an unordered list with two items: HTML and CSS.",
      Markup, Intermediate, "<ul>\n</ul>\n", "<ul><li>HTML</li><li>CSS</li></ul>", 150),
    challenge("css-color", "Colors", "Write a paragraph with the text Alert whose inline style sets the color to red.",
      Markup, Intermediate, "<p>Alert</p>\n", "<p style=\"color: red;\">Alert</p>", 150),
    challenge("html-form", "Forms", "Add a text input named username.",
      Markup, Intermediate, "<form>\n</form>\n", "<input type=\"text\" name=\"username\">", 150),

    // --- HTML/CSS, expert ---
    challenge("css-flex", "Flexbox", "Open a div whose inline style makes it a flex container centering its content horizontally.",
      Markup, Expert, "<div>\n</div>\n", "<div style=\"display: flex; justify-content: center;\">", 250),
    challenge("html-table", "Tables", "Build a table with a header cell Name and a data cell Ada, each in its own row.",
      Markup, Expert, "<table>\n</table>\n", "<table><tr><th>Name</th></tr><tr><td>Ada</td></tr></table>", 250),
    challenge("css-grid", "Grid", "In a style block, make the .grid class a grid with two equal columns.",
      Markup, Expert, "<style>\n</style>\n", "<style>.grid { display: grid; grid-template-columns: 1fr 1fr; }</style>", 250),
  ]
}

fn badge(id: &str, title: &str, description: &str, trigger: BadgeTrigger) -> Badge {
  Badge { id: id.into(), title: title.into(), description: description.into(), trigger }
}

/// Badge table in display order; the engine reports new badges in this order.
pub fn seed_badges() -> Vec<Badge> {
  use BadgeTrigger::*;
  use Category::{MarkupStyle, ScriptLanguage};
  use Level::{Beginner, Expert, Intermediate};

  vec![
    badge("points-100", "Centurion", "Reach 100 points.", PointThreshold { points: 100 }),
    badge("points-500", "Point Master", "Reach 500 points.", PointThreshold { points: 500 }),
    badge("complete-1", "First Steps", "Complete your first challenge.", CompletionCount { count: 1 }),
    badge("complete-10", "Apprentice Coder", "Complete 10 challenges.", CompletionCount { count: 10 }),
    badge("python-beginner", "Python Beginner", "Complete every beginner Python challenge.",
      CategoryLevelComplete { category: ScriptLanguage, level: Beginner }),
    badge("python-intermediate", "Python Intermediate", "Complete every intermediate Python challenge.",
      CategoryLevelComplete { category: ScriptLanguage, level: Intermediate }),
    badge("python-expert", "Python Expert", "Complete every expert Python challenge.",
      CategoryLevelComplete { category: ScriptLanguage, level: Expert }),
    badge("html-beginner", "HTML/CSS Beginner", "Complete every beginner HTML/CSS challenge.",
      CategoryLevelComplete { category: MarkupStyle, level: Beginner }),
    badge("html-intermediate", "HTML/CSS Intermediate", "Complete every intermediate HTML/CSS challenge.",
      CategoryLevelComplete { category: MarkupStyle, level: Intermediate }),
    badge("html-expert", "HTML/CSS Expert", "Complete every expert HTML/CSS challenge.",
      CategoryLevelComplete { category: MarkupStyle, level: Expert }),
    badge("master-coder", "Master Coder", "Complete every available challenge.", FullCompletion),
  ]
}

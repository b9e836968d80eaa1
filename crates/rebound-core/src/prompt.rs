/// Few-shot examples carried in every prompt. Kept small; the schema block
/// does most of the work.
const EXAMPLES: &str = r#"<example>
[
  {
    "natural_language": "How many teams are currently in the NBA?",
    "sql": "SELECT COUNT(*) as team_count FROM team LIMIT 1"
  },
  {
    "natural_language": "List all teams from Texas.",
    "sql": "SELECT full_name FROM team WHERE state = 'Texas'"
  },
  {
    "natural_language": "What's the most points scored by the away team?",
    "sql": "SELECT pts_away FROM game ORDER BY pts_away DESC LIMIT 1"
  }
]
</example>"#;

/// Builds the two prompt variants of the loop. The schema description is
/// computed once per run and embedded verbatim, as is the question.
pub struct PromptBuilder {
    schema: String,
}

impl PromptBuilder {
    pub fn new(schema: String) -> Self {
        Self { schema }
    }

    fn preamble(&self, question: &str) -> String {
        format!(
            "You are an AI assistant tasked with converting natural language questions \
about the NBA into SQL queries. You will be provided with a database schema to help \
you understand the structure of the data and formulate correct SQL queries.\n\n\
<schema>\n{schema}</schema>\n\n\
<query>{question}</query>\n\n\
Please analyze the query and think through how to convert it into SQL. Consider:\n\
1. Which table(s) in the schema are relevant?\n\
2. What columns need to be selected? Do not create new columns.\n\
3. Are any aggregations or groupings required?\n\
4. Are there any conditions that need to be applied (WHERE clause)?\n\
5. Is there a limit on the number of results to return?\n\n\
Here are some examples with a \"natural_language\" field and a \"sql\" field:\n\n\
{examples}\n",
            schema = self.schema,
            question = question,
            examples = EXAMPLES,
        )
    }

    /// First-attempt prompt: question + schema, SQL requested inside
    /// `<sql_query>` tags.
    pub fn initial(&self, question: &str) -> String {
        format!(
            "{}\nNow provide the SQL query that answers this question. Write exactly one SQL \
statement inside <sql_query> tags.\n\n\
Think first within <thinking> </thinking>; this will not be shown to the user. Then \
output your final answer within <answer> </answer>, containing the <sql_query> section.\n",
            self.preamble(question)
        )
    }

    /// Second-attempt prompt: adds the failed SQL, its execution error (if
    /// any) and the ground-truth expected SQL as one-shot feedback.
    pub fn feedback(
        &self,
        question: &str,
        previous_sql: Option<&str>,
        previous_error: Option<&str>,
        expected_sql: &str,
    ) -> String {
        let mut out = self.preamble(question);

        out.push_str("\nYour previous attempt did not produce the expected result.\n");
        if let Some(sql) = previous_sql {
            out.push_str(&format!(
                "\n<previous_attempt>\n{}\n</previous_attempt>\n",
                sql
            ));
        }
        if let Some(err) = previous_error {
            out.push_str(&format!("\n<execution_error>\n{}\n</execution_error>\n", err));
        }
        out.push_str(&format!(
            "\nHere is the expected SQL query:\n\n<expected_sql>\n{}\n</expected_sql>\n",
            expected_sql
        ));
        out.push_str(
            "\nThink first within <thinking> </thinking>. Then output your final answer \
within <answer> </answer>, writing a corrected SQL statement inside <sql_query> tags. \
If the queries differ but are similar, would return the same result, and have similar \
efficiency, add a short note within <feedback></feedback> tags.\n",
        );
        out
    }
}

pub struct PromptTemplate;

impl PromptTemplate {
    pub fn build_system_prompt() -> String {
        r#"You are a senior financial data engineer who writes complete, runnable Python scripts for stock-market analysis and visualization. You respond with a single Python script and nothing else - no commentary, no markdown."#.to_string()
    }

    pub fn build_generation_prompt(query: &str) -> String {
        format!(
            r#"PYTHON ANALYSIS SCRIPT REQUEST

USER QUERY: {}

SCRIPT REQUIREMENTS:
1. Download the market data the query asks for with yfinance.
2. Use pandas for any aggregation or indicator computation.
3. Render every chart with matplotlib and save it as a .png file in the
   current working directory via plt.savefig(); never call plt.show().
4. Give each saved file a short descriptive name (e.g. tsla_6mo_close.png).
5. Print a short text summary of the findings to stdout.
6. The script must be self-contained and runnable as-is: all imports at the
   top, no placeholders, no interactive input.
7. If a download comes back empty, print a clear message and exit cleanly
   instead of raising.

OUTPUT FORMAT:
Return ONLY the Python source code of the script."#,
            query
        )
    }
}

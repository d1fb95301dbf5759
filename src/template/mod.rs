//! A small Handlebars-flavoured template language.
//!
//! Templates are compiled once into a node tree and rendered against a
//! [`serde_json::Value`]. Besides `if`, `unless` and `each` the language knows
//! the value helpers `eq`, `ne`, `contains`, `startsWith`, `or`, `array` and
//! `some`. Output is never HTML-escaped.

use std::str::FromStr;

use serde_json::Value;

mod error;
mod helpers;
mod lexer;
mod parser;
mod render;

pub use error::TemplateError;
pub use helpers::{is_truthy, string_form, values_equal};

use parser::Node;

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Compile `source`. Every structural error is reported here, never at render time.
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let segments = lexer::tokenize(source)?;
        let nodes = parser::parse(segments)?;
        Ok(Self { nodes })
    }

    #[must_use]
    pub fn render(&self, data: &Value) -> String {
        render::render(&self.nodes, data)
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn render(source: &str, data: &Value) -> String {
        Template::compile(source)
            .expect("template compiles")
            .render(data)
    }

    fn sample() -> Value {
        json!({
            "date": "2024-05-02",
            "timestamp": "2024-05-02 18:00",
            "commits": [
                {"time": "08:30", "message": "fix: login", "repo": "api", "branch": "main"},
                {"time": "09:00", "message": "feat: search", "repo": "web", "branch": "dev"},
            ],
            "staged": [],
            "unstaged": [{"repo": "web", "file": "notes.md (new)"}],
            "branches": [
                {"repo": "api", "name": "main", "isPushed": true, "unpushedCount": 0},
                {"repo": "web", "name": "dev", "isPushed": false, "unpushedCount": -1},
            ],
        })
    }

    #[test]
    fn plain_text_passes_through() {
        let text = "no tags <b>&</b>\n";
        assert_eq!(render(text, &json!({})), text);
    }

    #[test]
    fn variables_and_paths() {
        let data = json!({
            "a": {"b": "deep"},
            "n": 3,
            "flag": false,
            "list": [1, 2],
            "none": null,
        });
        let source = "{{a.b}} {{n}} {{flag}} {{list}} [{{none}}] [{{missing}}] {{{a.b}}}";
        assert_eq!(render(source, &data), "deep 3 false 1,2 [] [] deep");
    }

    #[test]
    fn each_exposes_scope_and_data_variables() {
        let source = concat!(
            "{{#each commits}}{{@index}}:{{message}}@{{../timestamp}}",
            "{{#unless @last}}, {{/unless}}{{/each}}",
        );
        assert_eq!(
            render(source, &sample()),
            "0:fix: login@2024-05-02 18:00, 1:feat: search@2024-05-02 18:00"
        );
    }

    #[test]
    fn root_paths_reach_the_top_level_from_nested_blocks() {
        let source = "{{#each commits}}{{@root.date}}/{{repo}};{{/each}}";
        assert_eq!(render(source, &sample()), "2024-05-02/api;2024-05-02/web;");

        let nested = "{{#each branches}}{{#each (array 1)}}{{@root.date}} {{/each}}{{/each}}";
        assert_eq!(render(nested, &sample()), "2024-05-02 2024-05-02 ");
    }

    #[test]
    fn bare_names_fall_back_to_enclosing_scope() {
        let out = render("{{#each commits}}{{timestamp}}|{{/each}}", &sample());
        assert_eq!(out, "2024-05-02 18:00|2024-05-02 18:00|");
        let explicit = render("{{#each commits}}[{{this.timestamp}}]{{/each}}", &sample());
        assert_eq!(explicit, "[][]");
    }

    #[test]
    fn each_over_object_values_and_keys() {
        let data = json!({"m": {"x": 1, "y": 2}});
        let out = render("{{#each m}}{{@key}}={{this}};{{/each}}", &data);
        assert_eq!(out, "x=1;y=2;");
    }

    #[test]
    fn each_else_renders_for_empty_or_missing_sequences() {
        let source = "{{#each staged}}x{{else}}nothing staged{{/each}}";
        assert_eq!(render(source, &sample()), "nothing staged");
        assert_eq!(render(source, &json!({})), "nothing staged");
    }

    #[test]
    fn else_if_chains() {
        let source = "{{#if a}}A{{else if b}}B{{else unless c}}not C{{else}}C{{/if}}";
        assert_eq!(render(source, &json!({"a": 1})), "A");
        assert_eq!(render(source, &json!({"b": "yes"})), "B");
        assert_eq!(render(source, &json!({})), "not C");
        assert_eq!(render(source, &json!({"c": [1]})), "C");
    }

    #[test]
    fn comparison_helpers() {
        let data = json!({"n": 2, "s": "feature/login"});
        let equality = "{{eq n 2}} {{ne n 2.0}} {{eq s 'x'}}";
        assert_eq!(render(equality, &data), "true false false");
        let text = "{{contains s \"login\"}} {{startsWith s 'feat'}} {{startsWith n 2}}";
        assert_eq!(render(text, &data), "true true true");
        assert_eq!(render("{{#eq n 2}}two{{else}}other{{/eq}}", &data), "two");
    }

    #[test]
    fn string_literals_understand_escapes() {
        assert_eq!(render("{{'a\\nb'}}", &json!({})), "a\nb");
        assert_eq!(render(r#"{{"say \"hi\""}}"#, &json!({})), "say \"hi\"");
        assert_eq!(render(r"{{'it\'s'}}", &json!({})), "it's");
        assert_eq!(render(r"{{'tab\there'}}", &json!({})), "tab\there");
    }

    #[test]
    fn quoted_closing_braces_stay_inside_the_literal() {
        let data = json!({"message": "x}}y"});
        let source = r#"{{#if (eq message "x}}y")}}yes{{else}}no{{/if}}"#;
        assert_eq!(render(source, &data), "yes");
        assert_eq!(render("{{'}}'}}", &data), "}}");
    }

    #[test]
    fn or_and_array_helpers() {
        let or = "{{or 0 '' null}} {{or 0 'x'}}";
        assert_eq!(render(or, &json!({})), "false true");
        assert_eq!(render("{{array 1 'b' true}}", &json!({})), "1,b,true");
        let source = "{{#each (array 'x' 'y')}}<{{this}}>{{/each}}";
        assert_eq!(render(source, &json!({})), "<x><y>");
    }

    #[test]
    fn subexpressions_nest() {
        let data = json!({"a": 1, "b": 2});
        let source = "{{#if (or (eq a 2) (eq b 2))}}hit{{/if}}";
        assert_eq!(render(source, &data), "hit");
    }

    #[test]
    fn some_with_prefix_predicates() {
        let data = sample();
        let fixes = "{{some commits messageStartsWith=\"fix\"}}";
        assert_eq!(render(fixes, &data), "true");
        let only_known = "{{some commits messageNotStartsWithAny=\"fix,feat\"}}";
        assert_eq!(render(only_known, &data), "false");
        let spaced = "{{some commits messageNotStartsWithAny=\" fix , chore\"}}";
        assert_eq!(render(spaced, &data), "true");
    }

    #[test]
    fn some_requires_all_constraints_on_one_element() {
        let data = sample();
        let api_feat = "{{some commits repo='api' messageStartsWith='feat'}}";
        assert_eq!(render(api_feat, &data), "false");
        let web_feat = "{{some commits repo='web' messageStartsWith='feat'}}";
        assert_eq!(render(web_feat, &data), "true");
        let no_remote = "{{some branches isPushed=false unpushedCount=-1}}";
        assert_eq!(render(no_remote, &data), "true");
        assert_eq!(render("{{some timestamp repo='api'}}", &data), "false");
        let block = "{{#some branches isPushed=false}}unpushed{{else}}clean{{/some}}";
        assert_eq!(render(block, &data), "unpushed");
    }

    #[test]
    fn standalone_blocks_leave_no_blank_lines() {
        let source = "### Commits\n{{#each commits}}\n\
                      - {{time}} [{{repo}}] {{message}}\n{{/each}}\n";
        assert_eq!(
            render(source, &sample()),
            "### Commits\n- 08:30 [api] fix: login\n- 09:00 [web] feat: search\n"
        );
    }

    #[test]
    fn comments_render_nothing() {
        let source = "a{{! hi }}b{{!-- {{x}} --}}c";
        assert_eq!(render(source, &json!({"x": 1})), "abc");
    }

    #[test]
    fn rendering_is_repeatable() {
        let template = Template::compile("{{#each commits}}{{time}} {{/each}}")
            .expect("compiles");
        let data = sample();
        assert_eq!(template.render(&data), template.render(&data));
        assert_eq!(template.render(&data), "08:30 09:00 ");
    }

    #[test]
    fn parses_from_str() {
        let template: Template = "{{x}}".parse().expect("parses");
        assert_eq!(template.render(&json!({"x": "y"})), "y");
    }

    #[test]
    fn structural_errors_are_reported_at_compile_time() {
        assert!(matches!(
            Template::compile("{{#if commits}}x"),
            Err(TemplateError::UnclosedBlock { .. })
        ));
        assert!(matches!(
            Template::compile("{{#if a}}x{{/each}}"),
            Err(TemplateError::MismatchedClose { .. })
        ));
        assert!(matches!(
            Template::compile("x{{/if}}"),
            Err(TemplateError::UnexpectedClose { .. })
        ));
        assert!(matches!(
            Template::compile("{{else}}"),
            Err(TemplateError::UnexpectedElse { .. })
        ));
        assert!(matches!(
            Template::compile("{{frobnicate a}}"),
            Err(TemplateError::UnknownHelper { .. })
        ));
        assert!(matches!(
            Template::compile("{{eq a}}"),
            Err(TemplateError::Arity { .. })
        ));
        assert!(matches!(
            Template::compile("{{each xs}}"),
            Err(TemplateError::BlockOnly { .. })
        ));
    }
}

//! Prompt rendering for question/answer generation.
//!
//! [`build_prompt`] is a pure function: the same inputs always produce the
//! same bytes. Retrieved context is joined with newlines and embedded
//! after the current document's text.

/// Output shape every generated record must follow.
pub const RECORD_SHAPE: &str = r#"{
  "instruction": <created_question>,
  "input": <reference_passage_from_text>,
  "output": <detailed_answer>,
  "category": <standardized_category>
}"#;

const WORKED_EXAMPLE: &str = r#"{
  "instruction": "What is the main theme of the poem 'The Road Not Taken' by Robert Frost?",
  "input": "Two roads diverged in a yellow wood, And sorry I could not travel both And be one traveler, long I stood And looked down one as far as I could To where it bent in the undergrowth; Then took the other, as just as fair, And having perhaps the better claim, Because it was grassy and wanted wear; Though as for that the passing there Had worn them really about the same, And both that morning equally lay In leaves no step had trodden black. Oh, I kept the first for another day! Yet knowing how way leads on to way, I doubted if I should ever come back. I shall be telling this with a sigh Somewhere ages and ages hence: Two roads diverged in a wood, and I, I took the one less traveled by, And that has made all the difference.",
  "output": "The main theme of 'The Road Not Taken' by Robert Frost is the significance of the choices we make in life. The poem presents a metaphorical fork in the road, where the speaker must decide between two paths that stand for the different directions one can take. The speaker's choice of the road 'less traveled by' symbolizes making unconventional choices, and the poem suggests that such choices, even if they seem small at the time, can shape one's life profoundly. It also touches on regret and the impossibility of knowing where the other path would have led.",
  "category": "Literature"
}"#;

/// Joins retrieved texts into one context block, one text per line.
pub fn join_context(similar_texts: &[String]) -> String {
    similar_texts.join("\n")
}

/// Renders the generation prompt for one document.
pub fn build_prompt(current_text: &str, similar_texts: &[String], question_count: usize) -> String {
    let context = join_context(similar_texts);
    format!(
        r#"You are tasked with creating a high-quality Q&A dataset based on the provided input text. Your goal is to generate {count} questions and their corresponding answers, along with relevant passages from the text and standardized categories.

<input_text>
Current File Context: {current}
Related Information:{context}
</input_text>

To create the Q&A dataset, follow these steps:

1. Carefully read through the input text and identify passages that are suitable for generating questions. Ensure that the selected passages are substantial enough to provide context for the questions and answers.
2. Create {count} questions based on the selected passages. Each question should be clear, concise, and relevant to the corresponding passage.
3. For each question, provide a detailed and descriptive answer based on the information contained within the relevant passage. Avoid copying the exact passage as the answer; instead, summarize and elaborate on the key points.
4. Assign a standardized category to each question-answer pair. The category should accurately reflect the main topic or theme of the question and answer. Use consistent and meaningful categories across the dataset.
5. Format your output as a list of JSON objects, with each object representing a single question-answer pair. Each JSON object must have the following structure:

{shape}

The "instruction" field contains the generated question, the "input" field contains the relevant passage from the text, the "output" field contains the detailed answer to the question, and the "category" field contains your best guess at a standardized category for the question-answer pair.

Example:

{example}

Remember to keep categories consistent and make every question-answer pair relevant and informative. The dataset will be used for applications such as training language models or creating educational resources.

Provide your output as a list of JSON objects, following the specified format. NO TEXT BEFORE OR AFTER THE JSON. Provide only the JSON.
"#,
        count = question_count,
        current = current_text,
        context = context,
        shape = RECORD_SHAPE,
        example = WORKED_EXAMPLE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn similar() -> Vec<String> {
        vec![
            "first related passage".to_string(),
            "second related passage".to_string(),
        ]
    }

    #[test]
    fn identical_inputs_render_identical_bytes() {
        let a = build_prompt("current document", &similar(), 2);
        let b = build_prompt("current document", &similar(), 2);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn context_joined_with_newlines() {
        assert_eq!(
            join_context(&similar()),
            "first related passage\nsecond related passage"
        );
        let prompt = build_prompt("doc", &similar(), 2);
        assert!(prompt.contains("Related Information:first related passage\nsecond related passage"));
    }

    #[test]
    fn embeds_document_count_shape_and_json_only_instruction() {
        let prompt = build_prompt("Ehlers-Danlos syndrome overview", &[], 7);
        assert!(prompt.contains("Current File Context: Ehlers-Danlos syndrome overview"));
        assert!(prompt.contains("generate 7 questions"));
        assert!(prompt.contains("Create 7 questions"));
        for field in ["\"instruction\"", "\"input\"", "\"output\"", "\"category\""] {
            assert!(prompt.contains(field), "missing {}", field);
        }
        assert!(prompt.contains("The Road Not Taken"));
        assert!(prompt.contains("NO TEXT BEFORE OR AFTER THE JSON"));
    }

    #[test]
    fn empty_context_renders_empty_block() {
        let prompt = build_prompt("doc", &[], 2);
        assert!(prompt.contains("Related Information:\n</input_text>"));
    }

    #[test]
    fn worked_example_is_valid_json() {
        let v: serde_json::Value = serde_json::from_str(WORKED_EXAMPLE).unwrap();
        assert!(v.get("category").is_some());
    }
}

pub const TEST_BANK_SYSTEM_PROMPT: &str = "You are an expert test bank author for college textbooks. You write clear, rigorous assessment questions that are answerable from the supplied chapter text alone, and you always answer with a single JSON object and nothing else.";

pub const TEST_BANK_TASK_INTRO: &str = "Write a test bank for the textbook chapter below. Derive every question from the SOURCE MATERIAL only; do not rely on outside knowledge or other editions of the book.";

pub const CONTENT_START_MARKER: &str = "<<<CHAPTER CONTENT";
pub const CONTENT_END_MARKER: &str = "CHAPTER CONTENT>>>";

pub const OUTPUT_EXAMPLE: &str = r#"{
  "title": "BOOK TITLE",
  "chapter": "CHAPTER NAME",
  "questions": [
    {
      "id": "1",
      "type": "multiple-choice",
      "learning_objective": "LO1",
      "question_text": "Which statement best describes ...?",
      "options": [
        { "label": "A", "text": "Option text" },
        { "label": "B", "text": "Option text" },
        { "label": "C", "text": "Option text" },
        { "label": "D", "text": "Option text" }
      ],
      "correct_answer": "A",
      "rationale": "A is correct because ..."
    },
    {
      "id": "2",
      "type": "true-false",
      "learning_objective": "LO2",
      "question_text": "Statement to evaluate.",
      "correct_answer": "True",
      "rationale": "The statement is true because ..."
    },
    {
      "id": "3",
      "type": "argument",
      "learning_objective": "LO3",
      "question_text": "Take a position on ... and defend it.",
      "correct_answer": "A strong answer argues ... and cites ...",
      "rationale": "This question assesses ..."
    }
  ]
}"#;

pub const OUTPUT_RULES: &str = "RULES
1. Every question has a \"type\" of \"multiple-choice\", \"true-false\" or \"argument\" and a \"learning_objective\".
2. Multiple-choice questions have exactly 4 options labelled A-D, exactly one correct answer given by its label, plausible distractors, and a stem ending in a question mark.
3. True/false questions use \"True\" or \"False\" as the correct_answer.
4. Argument questions put grading guidance for a model answer in correct_answer.
5. Every question has a rationale explaining the correct answer.
6. Use inclusive, unbiased language.
7. Return the JSON object only. No markdown fences, no commentary.";

use crate::models::assessment::Question;

#[derive(Debug, Clone)]
pub struct WrongAnswer {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
}

#[derive(Debug)]
pub struct GradeOutcome {
    pub score: i32,
    pub correct_count: usize,
    pub wrong_answers: Vec<WrongAnswer>,
}

pub struct GradingService;

impl GradingService {
    /// Grade submitted answers positionally against the stored questions.
    /// Answers are exact option text and compared byte-for-byte. Mutates the
    /// questions in place with the recorded answer and correctness flag.
    pub fn grade(questions: &mut [Question], answers: &[String]) -> GradeOutcome {
        let mut correct_count = 0;
        let mut wrong_answers = Vec::new();

        for (question, answer) in questions.iter_mut().zip(answers.iter()) {
            let is_correct = *answer == question.correct_answer;
            question.user_answer = Some(answer.clone());
            question.is_correct = Some(is_correct);

            if is_correct {
                correct_count += 1;
            } else {
                wrong_answers.push(WrongAnswer {
                    question: question.question.clone(),
                    user_answer: answer.clone(),
                    correct_answer: question.correct_answer.clone(),
                });
            }
        }

        GradeOutcome {
            score: score_percent(correct_count, questions.len()),
            correct_count,
            wrong_answers,
        }
    }
}

/// `round(100 * correct / total)`, clamped to 0 for an empty quiz.
pub fn score_percent(correct_count: usize, question_count: usize) -> i32 {
    if question_count == 0 {
        return 0;
    }
    ((correct_count as f64 / question_count as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i32, correct: &str) -> Question {
        Question {
            id,
            question: format!("Question {}?", id),
            options: vec![
                "Alpha".into(),
                "Beta".into(),
                "Gamma".into(),
                correct.into(),
            ],
            correct_answer: correct.into(),
            user_answer: None,
            is_correct: None,
        }
    }

    #[test]
    fn four_of_five_correct_scores_eighty() {
        let mut questions: Vec<Question> =
            (1..=5).map(|i| question(i, &format!("Right {}", i))).collect();
        let answers: Vec<String> = vec![
            "Right 1".into(),
            "Right 2".into(),
            "Alpha".into(),
            "Right 4".into(),
            "Right 5".into(),
        ];

        let outcome = GradingService::grade(&mut questions, &answers);

        assert_eq!(outcome.score, 80);
        assert_eq!(outcome.correct_count, 4);
        assert_eq!(outcome.wrong_answers.len(), 1);
        assert_eq!(outcome.wrong_answers[0].user_answer, "Alpha");
        assert_eq!(outcome.wrong_answers[0].correct_answer, "Right 3");

        assert_eq!(questions[2].is_correct, Some(false));
        assert_eq!(questions[2].user_answer.as_deref(), Some("Alpha"));
        assert_eq!(questions[0].is_correct, Some(true));
    }

    #[test]
    fn comparison_is_exact_text() {
        let mut questions = vec![question(1, "Beta ")];
        let answers = vec!["Beta".to_string()];
        let outcome = GradingService::grade(&mut questions, &answers);
        assert_eq!(outcome.correct_count, 0);
    }

    #[test]
    fn score_bounds() {
        assert_eq!(score_percent(0, 5), 0);
        assert_eq!(score_percent(5, 5), 100);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(0, 0), 0);
    }
}

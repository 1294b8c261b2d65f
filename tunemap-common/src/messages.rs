//! Localized user-facing message constants
//!
//! The presentation layer shows these verbatim; the core picks which one
//! applies. Validation messages are carried inside `Error::Validation`,
//! outcome titles/bodies are assembled by the submission pipeline.

/// Sign-in rejected: one of class / seat / name is blank
pub const MSG_IDENTITY_INCOMPLETE: &str = "⚠️ 紀錄需完整：班級、座號與姓名";

/// Submission rejected: no quiz answer selected
pub const MSG_ANSWER_MISSING: &str = "🔍 尚未搜查到線索回答喔！";

/// Submission rejected: structured note has unfilled blanks
pub const MSG_NOTE_INCOMPLETE: &str = "✍️ 航行筆記尚未完成喔！";

/// Title of the single-timer conflict warning
pub const TITLE_FOCUS_CHECK: &str = "⚠️ 專注力檢測";

/// Title shown when the recorder write fails
pub const TITLE_TRANSMIT_FAILED: &str = "⚠️ 傳送失敗";

/// Body shown when the recorder write fails
pub const MSG_TRANSMIT_FAILED: &str = "請檢查網路法陣。";

/// Title for the island-mastery outcome
pub const TITLE_MASTERY: &str = "🏆 島嶼制霸！";

/// Title for a correct-answer outcome
pub const TITLE_CORRECT: &str = "🏅 完美的觀察！";

/// Body for a correct-answer outcome
pub const MSG_CORRECT: &str = "鎖定線索，紀錄已封存。";

/// Title for an incorrect-answer outcome
pub const TITLE_INCORRECT: &str = "🧗 再次探索吧！";

/// Verdict token recorded for a correct answer
pub const VERDICT_CORRECT: &str = "答對";

/// Verdict token recorded for an incorrect answer
pub const VERDICT_INCORRECT: &str = "答錯";

/// Deterministic remark used whenever the generative capability fails
pub const FALLBACK_REMARK: &str =
    "你的感悟已被記錄在星圖之中，這段航程因你的思考而閃耀。繼續前進吧，探險員！";

/// First line of the single-timer conflict, naming the running song.
/// Also the display text of the conflict error itself.
pub fn conflict_line(song: &str) -> String {
    format!("已有其他樂章《{}》正在解封中", song)
}

/// Full body of the single-timer conflict warning, naming the running song
pub fn focus_conflict(song: &str) -> String {
    format!(
        "{}。\n請先專心完成該首歌曲的聆聽與探索，再進行下一首。",
        conflict_line(song)
    )
}

/// Mastery outcome body for a conquered island
pub fn mastery_message(island: &str) -> String {
    format!("征服了「{}」！", island)
}

/// Incorrect outcome body revealing the canonical answer
pub fn incorrect_message(correct_answer: &str) -> String {
    format!("真相其實是：「{}」。", correct_answer)
}

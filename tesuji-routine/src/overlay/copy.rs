//! Fixed overlay wording.

pub const PUZZLE_TITLE: &str = "Study";
pub const PUZZLE_FINISH_TITLE: &str = "Finish the current problem";
pub const PUZZLE_FINISH_SUBTITLE: &str = "Auto-advancing when complete";
pub const PUZZLE_COMPLETE_TITLE: &str = "Study complete!";
pub const PUZZLE_COMPLETE_SUBTITLE: &str = "Moving to play block";

pub const PLAY_TITLE: &str = "Play";
pub const PLAY_WAITING_TITLE: &str = "Waiting for game to finish...";
pub const GAME_FINISHED_TITLE: &str = "Game finished";
pub const GAME_FINISHED_SUBTITLE: &str = "Click NEXT for review or keep playing";
pub const GAME_FINISHED_AUTO_TITLE: &str = "Game finished!";
pub const GAME_FINISHED_AUTO_SUBTITLE: &str = "Auto-advancing to AI review";
pub const PLAY_COMPLETE_TITLE: &str = "Play block complete!";
pub const PLAY_COMPLETE_SUBTITLE: &str = "Click NEXT to review";

pub const REVIEW_TITLE: &str = "Review";
pub const REVIEW_COMPLETE_TITLE: &str = "Review complete!";
pub const REVIEW_COMPLETE_SUBTITLE: &str = "Click NEXT to play again";

pub const ACCOUNT_SETUP_TITLE: &str = "Account Setup";

/// Appended to the play countdown once the routine has looped at least once.
pub const EXTRA_PRACTICE_SUFFIX: &str = " <span style='color:#8fb3ff;'>(extra practice)</span>";

use colored::Colorize;

use util::Timer;

/// All interactions with the text UI should go through this struct.
pub struct Ui {
    /// -v setting, displays extra text info to user
    pub verbose: bool,
    /// keeps track of time for each stage
    timer: Timer,
}

impl Ui {
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose: verbose > 0,
            timer: Timer::now(),
        }
    }

    /// Announce the start of a pipeline stage.
    pub fn stage(&mut self, name: &str) {
        eprintln!("{} {name}", "STAGE".magenta());
        if self.verbose {
            self.timer.reset();
        }
    }

    pub fn print_elapsed(&self, stage: &str) {
        if self.verbose {
            self.timer.print_elapsed(stage);
        }
    }

    pub fn verbose_msg(&self, msg: &str) {
        if self.verbose {
            eprintln!("{}", msg);
        }
    }

    pub fn verbose_progress(&self, msg: &str) {
        if self.verbose {
            eprint!("{}... ", msg.magenta());
        }
    }

    pub fn done(&self) {
        if self.verbose {
            eprintln!("{}.", "done".green());
        }
    }
}

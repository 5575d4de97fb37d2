#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    PlacingPin(usize),
    Preparing { size: u32 },
    Computing { threads: usize, loss: f64 },
    Converged { threads: usize, loss: f64 },
    NoImprovement { threads: usize, loss: f64 },
    Capped { threads: usize, loss: f64 },
}

pub trait Verboser {
    fn verbose(&mut self, message: Message);
}

pub struct Silent;

impl Verboser for Silent {
    fn verbose(&mut self, _: Message) {}
}

/// Collects every message. Handy to inspect a run afterwards.
impl Verboser for Vec<Message> {
    fn verbose(&mut self, message: Message) {
        self.push(message);
    }
}

/// Forwards messages to the `log` facade. Progress is logged at `info` level every
/// `interval` threads and at `debug` level otherwise. An interval of 0 keeps all
/// progress at `debug`.
pub struct Logger {
    interval: usize,
}

impl Logger {
    pub fn new(interval: usize) -> Self {
        Self { interval }
    }

    fn progress_level(&self, threads: usize) -> log::Level {
        if self.interval != 0 && threads % self.interval == 0 {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Verboser for Logger {
    fn verbose(&mut self, message: Message) {
        match message {
            Message::PlacingPin(idx) => log::trace!("placing pin {idx}"),
            Message::Preparing { size } => log::info!("preparing a {size}x{size} target"),
            Message::Computing { threads, loss } => {
                log::log!(self.progress_level(threads), "loss ({threads} threads) = {loss}")
            }
            Message::Converged { threads, loss } => {
                log::info!("optimization converged after {threads} threads, loss = {loss}")
            }
            Message::NoImprovement { threads, loss } => log::info!(
                "no thread improves the loss after {threads} threads, loss = {loss}"
            ),
            Message::Capped { threads, loss } => {
                log::info!("thread cap reached at {threads} threads, loss = {loss}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_reported_at_info_every_interval() {
        let logger = Logger::new(100);
        assert_eq!(logger.progress_level(0), log::Level::Info);
        assert_eq!(logger.progress_level(200), log::Level::Info);
        assert_eq!(logger.progress_level(1), log::Level::Debug);
        assert_eq!(logger.progress_level(199), log::Level::Debug);

        let quiet = Logger::new(0);
        assert_eq!(quiet.progress_level(0), log::Level::Debug);
        assert_eq!(quiet.progress_level(1000), log::Level::Debug);
    }
}

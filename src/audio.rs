/// Named sound clips the game asks the host to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    Background,
    Shoot,
    Explosion,
    LevelUp,
    Victory,
}

impl Clip {
    /// Asset key the host's sound library knows the clip by.
    pub fn name(&self) -> &'static str {
        match self {
            Clip::Background => "background",
            Clip::Shoot => "shoot",
            Clip::Explosion => "explosion",
            Clip::LevelUp => "levelUp",
            Clip::Victory => "victory",
        }
    }

    /// Volume the game plays each clip at.
    pub fn default_volume(&self) -> f32 {
        match self {
            Clip::Background => 0.5,
            Clip::Shoot => 0.3,
            Clip::Explosion => 0.4,
            Clip::LevelUp | Clip::Victory => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCommand {
    Play { clip: Clip, volume: f32, looped: bool },
    Stop { clip: Clip },
}

/// Fire-and-forget audio commands, drained by the host once per frame.
#[derive(Debug, Default)]
pub struct AudioQueue {
    commands: Vec<AudioCommand>,
}

impl AudioQueue {
    pub fn play(&mut self, clip: Clip) {
        self.commands.push(AudioCommand::Play {
            clip,
            volume: clip.default_volume(),
            looped: false,
        });
    }

    pub fn play_looped(&mut self, clip: Clip) {
        self.commands.push(AudioCommand::Play {
            clip,
            volume: clip.default_volume(),
            looped: true,
        });
    }

    pub fn stop(&mut self, clip: Clip) {
        self.commands.push(AudioCommand::Stop { clip });
    }

    pub fn drain(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

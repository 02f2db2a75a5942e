/// Every command the player understands, from any input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,

    TogglePause,
    PlayNext,
    PlayPrev,
    ToggleShuffle,
    CycleLoopMode,

    ToggleMute,
    VolumeUp,
    VolumeDown,
    SeekForward,
    SeekBack,

    LyricsOffsetPlus,
    LyricsOffsetMinus,
    RefreshLyrics,

    ToggleTimeDisplay,
    ToggleLyricsPane,
    Resize,
}

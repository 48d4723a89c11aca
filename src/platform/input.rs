use enigo::{
    Direction::{Click, Press, Release},
    Enigo, Key, Keyboard, Settings,
};

use crate::error::AppError;
use crate::ports::InputPort;

#[cfg(target_os = "macos")]
const SHORTCUT_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const SHORTCUT_MODIFIER: Key = Key::Control;

/// 按键模拟端口：macOS 使用 Cmd，其余平台使用 Ctrl
#[derive(Debug, Default, Clone, Copy)]
pub struct EnigoInput;

impl EnigoInput {
    pub fn new() -> Self {
        Self
    }

    fn chord(&self, letter: char) -> Result<(), AppError> {
        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| AppError::Input(format!("初始化输入模拟失败: {}", e)))?;

        enigo
            .key(SHORTCUT_MODIFIER, Press)
            .and_then(|_| enigo.key(Key::Unicode(letter), Click))
            .and_then(|_| enigo.key(SHORTCUT_MODIFIER, Release))
            .map_err(|e| AppError::Input(format!("模拟按键 {} 失败: {}", letter, e)))?;

        log::debug!("已模拟快捷键 {:?}+{}", SHORTCUT_MODIFIER, letter);
        Ok(())
    }
}

impl InputPort for EnigoInput {
    fn press_paste_keystroke(&self) -> Result<(), AppError> {
        self.chord('v')
    }

    fn press_copy_keystroke(&self) -> Result<(), AppError> {
        self.chord('c')
    }
}

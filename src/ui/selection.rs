//! 带光标的列表，所有可选择的面板共用

/// 有序条目，光标始终在范围内
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionList<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Default for SelectionList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SelectionList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
        }
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self { items, cursor: 0 }
    }

    /// 用 `loader` 的返回值替换内容
    ///
    /// 失败时列表保持不变，并返回错误。
    pub fn refresh<E>(&mut self, loader: impl FnOnce() -> Result<Vec<T>, E>) -> Result<(), E> {
        let items = loader()?;
        self.items = items;
        self.clamp();
        Ok(())
    }

    /// 光标移动 `delta`，到两端为止
    pub fn move_by(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    fn clamp(&mut self) {
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }
}

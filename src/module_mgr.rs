#![doc(hidden)]

use anyhow::Error;
use teloxide::prelude::*;
use teloxide::types::BotCommand;

use crate::types::TeloxideHandler;

#[async_trait]
pub(crate) trait Module {
    /// Inserts the services this module provides into `dep_map`. Modules
    /// registered later may look up what earlier ones inserted.
    async fn register_dependency(&mut self, dep_map: &mut DependencyMap) -> Result<(), Error>;

    fn handler_chain(&self) -> TeloxideHandler {
        dptree::entry()
    }

    fn commands(&self) -> Vec<BotCommand> {
        vec![]
    }
}

pub(crate) struct ModuleManager {
    modules: Vec<Box<dyn Module + Send + 'static>>,
}

impl ModuleManager {
    pub fn new() -> Self {
        Self { modules: vec![] }
    }

    pub fn register_module<M>(&mut self, module: M)
    where
        M: Module + Send + 'static,
    {
        self.modules.push(Box::new(module));
    }

    pub fn with_all_modules<F>(&self, mut f: F)
    where
        F: FnMut(&dyn Module),
    {
        for module in self.modules.iter() {
            f(module.as_ref());
        }
    }

    pub async fn register_dependencies(&mut self, dep_map: &mut DependencyMap) -> Result<(), Error> {
        for module in self.modules.iter_mut() {
            module.register_dependency(dep_map).await?;
        }
        Ok(())
    }

    pub fn commands(&self) -> Vec<BotCommand> {
        let mut commands = vec![];
        self.with_all_modules(|m| commands.extend(m.commands()));
        commands
    }
}

#[cfg(test)]
mod tests {
    use teloxide::dptree::di::DependencySupplier;

    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Module for Named {
        async fn register_dependency(&mut self, dep_map: &mut DependencyMap) -> Result<(), Error> {
            dep_map.insert(self.0.to_owned());
            Ok(())
        }

        fn commands(&self) -> Vec<BotCommand> {
            vec![BotCommand::new(self.0, "test")]
        }
    }

    #[tokio::test]
    async fn test_register_in_order() {
        let mut module_mgr = ModuleManager::new();
        module_mgr.register_module(Named("first"));
        module_mgr.register_module(Named("second"));

        let mut dep_map = DependencyMap::new();
        module_mgr.register_dependencies(&mut dep_map).await.unwrap();

        // Later insertions of the same type replace earlier ones.
        let value: std::sync::Arc<String> = dep_map.get();
        assert_eq!(value.as_str(), "second");

        let commands: Vec<_> = module_mgr
            .commands()
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert_eq!(commands, vec!["first", "second"]);
    }
}

use std::rc::Rc;

use tether_core::prelude::*;

/// Child logs its own mount and unmount.
fn child() {
    let unmounted = use_unmounted_ref();
    use_mount({
        let unmounted = unmounted.clone();
        move || log::info!("child mounted (unmounted = {})", unmounted.get())
    });
    use_unmount({
        let unmounted = unmounted.clone();
        move || log::info!("child unmounted (unmounted = {})", unmounted.get())
    });
}

struct ParentView {
    show_child: bool,
    toggle: Dispatch<bool, ()>,
    update: UpdateTrigger,
    renders: u64,
}

/// Parent owns the toggle and a "force update" button.
fn parent() -> ParentView {
    let (show_child, toggle) = use_reducer(|| true, |shown: &bool, _: ()| !shown);
    let update = use_update();
    let renders = use_ref(|| 0u64);
    renders.modify(|n| *n += 1);

    ParentView {
        show_child,
        toggle,
        update,
        renders: renders.get(),
    }
}

#[derive(Clone, Copy, Debug)]
enum Action {
    Toggle,
    Update,
}

struct App {
    rt: Runtime,
    queue: Rc<RenderQueue>,
    parent: InstanceId,
    child: Option<InstanceId>,
    view: ParentView,
}

impl App {
    fn new() -> anyhow::Result<Self> {
        let queue = Rc::new(RenderQueue::new());
        let rt = Runtime::new(RuntimeConfig::default(), queue.clone());
        let parent_id = rt.create_instance();
        let view = rt.render(parent_id, parent)?;

        let mut app = Self {
            rt,
            queue,
            parent: parent_id,
            child: None,
            view,
        };
        app.reconcile()?;
        app.commit()?;
        Ok(app)
    }

    /// Brings the child in line with the parent's last render.
    fn reconcile(&mut self) -> anyhow::Result<()> {
        match (self.view.show_child, self.child) {
            (true, None) => {
                let id = self.rt.create_instance();
                self.rt.render(id, child)?;
                self.child = Some(id);
            }
            (true, Some(id)) => self.rt.render(id, child)?,
            (false, Some(id)) => {
                self.rt.unmount(id)?;
                self.child = None;
            }
            (false, None) => {}
        }
        Ok(())
    }

    /// Mounts whatever rendered for the first time, children first.
    fn commit(&self) -> anyhow::Result<()> {
        for id in self.child.into_iter().chain([self.parent]) {
            if self.rt.lifecycle(id)?.phase() == Phase::Pending {
                self.rt.mount(id)?;
            }
        }
        Ok(())
    }

    fn dispatch(&self, action: Action) {
        log::info!("action: {action:?}");
        match action {
            Action::Toggle => self.view.toggle.dispatch(()),
            Action::Update => self.view.update.trigger(),
        }
    }

    /// Re-renders every instance the runtime asked for.
    fn flush(&mut self) -> anyhow::Result<()> {
        loop {
            let requested = self.queue.drain_requests();
            if requested.is_empty() {
                return Ok(());
            }
            if requested.contains(&self.parent) {
                self.view = self.rt.render(self.parent, parent)?;
                log::info!(
                    "parent render #{} (show_child = {}, forced updates = {})",
                    self.view.renders,
                    self.view.show_child,
                    self.view.update.count()
                );
            }
            self.reconcile()?;
            self.commit()?;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut app = App::new()?;
    for action in [
        Action::Update,
        Action::Toggle,
        Action::Update,
        Action::Update,
        Action::Toggle,
    ] {
        app.dispatch(action);
        app.flush()?;
    }

    for error in app.queue.drain_errors() {
        log::error!("{error}");
    }
    log::info!("{} instances alive", app.rt.len());
    Ok(())
}

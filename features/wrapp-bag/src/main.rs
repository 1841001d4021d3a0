use std::{error::Error, sync::Arc};

use wrapp_bag::{constant, inject, Deps, Lazy, Rejected};

fn main() {
    let bag = wrapp_bag::global();
    bag.one("greeting", constant("Hello")).unwrap();
    bag.one(
        "name",
        inject(&[], |_| async {
            Ok::<_, Box<dyn Error + Send + Sync>>("wrapp".to_string())
        }),
    )
    .unwrap();
    bag.each("flaky", inject(&[], |_| async { Err::<String, _>("flaky is down") }))
        .unwrap();

    let greet = inject(
        &["greeting", "lazy_name", "lags_flaky"],
        |deps: Deps| async move {
            let greeting = deps.get::<Arc<&str>>(0)?;
            let name = deps.get::<Lazy>(1)?.get::<String>().await?;
            let flaky = deps.get::<Result<Arc<String>, Arc<Rejected>>>(2)?;
            Ok::<_, wrapp_bag::ResolveError>(format!("{greeting} {name}! ({flaky:?})"))
        },
    );

    let message = futures::executor::block_on(bag.run(greet)).unwrap();

    println!("{:?}", bag);
    println!("{:?}", message)
}
